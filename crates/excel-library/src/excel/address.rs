use crate::error::{ExcelError, Result};
use std::fmt;
use std::str::FromStr;

pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLUMNS: usize = 16_384;

/// 1-based cell coordinate, column first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: usize,
    pub row: usize,
}

impl CellRef {
    #[must_use]
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    #[must_use]
    pub const fn is_within_limits(&self) -> bool {
        self.column >= 1 && self.column <= MAX_COLUMNS && self.row >= 1 && self.row <= MAX_ROWS
    }

    /// Parses names like `A2`, `aa10` or `$B$3`.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || ExcelError::InvalidCellReference(name.to_string());
        let cleaned: String = name.trim().chars().filter(|c| *c != '$').collect();

        let split = cleaned
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let (letters, digits) = cleaned.split_at(split);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let column = column_index(letters).ok_or_else(invalid)?;
        let row: usize = digits.parse().map_err(|_| invalid())?;
        let cell = Self::new(column, row);
        if !cell.is_within_limits() {
            return Err(invalid());
        }
        Ok(cell)
    }
}

impl FromStr for CellRef {
    type Err = ExcelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_name(self.column), self.row)
    }
}

/// Column letters to a 1-based index (A=1, Z=26, AA=27). `None` for
/// anything that is not letters or lies past `XFD`.
#[must_use]
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut index = 0usize;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    (index <= MAX_COLUMNS).then_some(index)
}

/// 1-based column index to letters. Index 0 yields an empty string.
#[must_use]
pub fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        index = (index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A column given either as letters (`B`) or as a 1-based index (`2`).
pub fn parse_column(identifier: &str) -> Result<usize> {
    let trimmed = identifier.trim();
    let column = if trimmed.bytes().all(|b| b.is_ascii_digit()) && !trimmed.is_empty() {
        trimmed.parse::<usize>().ok()
    } else {
        column_index(trimmed)
    };
    column
        .filter(|c| (1..=MAX_COLUMNS).contains(c))
        .ok_or_else(|| ExcelError::InvalidCellReference(identifier.to_string()))
}
