use indexmap::IndexMap;

use crate::error::{ExcelError, Result};
use crate::excel::address::CellRef;
use crate::excel::value::CellValue;

static EMPTY: CellValue = CellValue::Empty;

/// A named grid of cells. Rows are ragged; cells past the end of a row are
/// empty. The populated extent always starts at `A1`.
///
/// Formulas are kept next to the grid, keyed by cell, so a workbook can be
/// saved without losing them. The grid holds their last calculated values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
    width: usize,
    formulas: IndexMap<CellRef, String>,
}

impl Sheet {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn from_rows(name: String, rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            name,
            rows,
            width,
            formulas: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn contains(&self, cell: CellRef) -> bool {
        cell.row >= 1
            && cell.column >= 1
            && cell.row <= self.row_count()
            && cell.column <= self.column_count()
    }

    fn out_of_range(&self, cell: CellRef) -> ExcelError {
        ExcelError::OutOfRange {
            sheet: self.name.clone(),
            column: cell.column,
            row: cell.row,
        }
    }

    /// Reads a cell inside the populated extent.
    pub fn get(&self, cell: CellRef) -> Result<&CellValue> {
        if !self.contains(cell) {
            return Err(self.out_of_range(cell));
        }
        Ok(self.rows[cell.row - 1]
            .get(cell.column - 1)
            .unwrap_or(&EMPTY))
    }

    /// Writes a cell, growing the sheet as needed. Clearing a cell never
    /// grows the sheet. Any formula in the cell is replaced by the value.
    pub fn set(&mut self, cell: CellRef, value: CellValue) -> Result<()> {
        if !cell.is_within_limits() {
            return Err(self.out_of_range(cell));
        }
        self.formulas.swap_remove(&cell);
        if value.is_empty() {
            if let Some(slot) = self
                .rows
                .get_mut(cell.row - 1)
                .and_then(|row| row.get_mut(cell.column - 1))
            {
                *slot = CellValue::Empty;
            }
            return Ok(());
        }

        if self.rows.len() < cell.row {
            self.rows.resize_with(cell.row, Vec::new);
        }
        let row = &mut self.rows[cell.row - 1];
        if row.len() < cell.column {
            row.resize(cell.column, CellValue::Empty);
        }
        row[cell.column - 1] = value;
        self.width = self.width.max(cell.column);
        Ok(())
    }

    /// Formula text of a cell, without the leading `=`.
    #[must_use]
    pub fn formula(&self, cell: CellRef) -> Option<&str> {
        self.formulas.get(&cell).map(String::as_str)
    }

    pub fn formulas(&self) -> impl Iterator<Item = (CellRef, &str)> {
        self.formulas
            .iter()
            .map(|(cell, formula)| (*cell, formula.as_str()))
    }

    /// Attaches a formula to a cell. The cell keeps its current value as the
    /// cached result.
    pub(crate) fn set_formula<S: Into<String>>(&mut self, cell: CellRef, formula: S) {
        self.formulas.insert(cell, formula.into());
    }

    /// Values of one column, top to bottom, across every row of the extent.
    pub fn column_values(&self, column: usize, include_empty: bool) -> Result<Vec<CellValue>> {
        if column == 0 || column > self.column_count() {
            return Err(self.out_of_range(CellRef::new(column, 1)));
        }
        Ok(filter_empty(
            self.rows
                .iter()
                .map(|row| row.get(column - 1).cloned().unwrap_or(CellValue::Empty)),
            include_empty,
        ))
    }

    /// Values of one row, left to right, padded to the column extent.
    pub fn row_values(&self, row: usize, include_empty: bool) -> Result<Vec<CellValue>> {
        if row == 0 || row > self.row_count() {
            return Err(self.out_of_range(CellRef::new(1, row)));
        }
        let width = self.column_count();
        let cells = &self.rows[row - 1];
        Ok(filter_empty(
            (0..width).map(|c| cells.get(c).cloned().unwrap_or(CellValue::Empty)),
            include_empty,
        ))
    }

    /// Row-major `(cell name, value)` pairs over the extent.
    #[must_use]
    pub fn named_values(&self, include_empty: bool) -> Vec<(String, CellValue)> {
        if !include_empty {
            return self
                .cells()
                .map(|(cell, value)| (cell.to_string(), value.clone()))
                .collect();
        }
        let width = self.column_count();
        let mut values = Vec::with_capacity(self.row_count() * width);
        for (r, cells) in self.rows.iter().enumerate() {
            for c in 0..width {
                let value = cells.get(c).cloned().unwrap_or(CellValue::Empty);
                values.push((CellRef::new(c + 1, r + 1).to_string(), value));
            }
        }
        values
    }

    /// Populated cells only, with their coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &CellValue)> {
        self.rows.iter().enumerate().flat_map(|(r, cells)| {
            cells
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.is_empty())
                .map(move |(c, value)| (CellRef::new(c + 1, r + 1), value))
        })
    }
}

fn filter_empty<I>(values: I, include_empty: bool) -> Vec<CellValue>
where
    I: Iterator<Item = CellValue>,
{
    if include_empty {
        values.collect()
    } else {
        values.filter(|v| !v.is_empty()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Sheet {
        let mut sheet = Sheet::new("Data");
        sheet.set(CellRef::new(1, 1), "Name".into()).unwrap();
        sheet.set(CellRef::new(2, 1), "Age".into()).unwrap();
        sheet.set(CellRef::new(1, 2), "Alice".into()).unwrap();
        sheet.set(CellRef::new(2, 2), CellValue::Number(30.0)).unwrap();
        sheet.set(CellRef::new(1, 4), "Bob".into()).unwrap();
        sheet
    }

    #[test]
    fn test_empty_sheet_has_no_extent() {
        let sheet = Sheet::new("Empty");
        assert_eq!(sheet.row_count(), 0);
        assert_eq!(sheet.column_count(), 0);
        assert!(sheet.get(CellRef::new(1, 1)).is_err());
    }

    #[test]
    fn test_set_extends_extent() {
        let sheet = sample();
        assert_eq!(sheet.row_count(), 4);
        assert_eq!(sheet.column_count(), 2);
        assert_eq!(sheet.get(CellRef::new(1, 3)).unwrap(), &CellValue::Empty);
        assert_eq!(sheet.get(CellRef::new(2, 4)).unwrap(), &CellValue::Empty);
    }

    #[test]
    fn test_read_outside_extent_is_out_of_range() {
        let sheet = sample();
        for cell in [CellRef::new(3, 1), CellRef::new(1, 5), CellRef::new(0, 1)] {
            assert!(matches!(
                sheet.get(cell),
                Err(ExcelError::OutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_write_beyond_limits_is_rejected() {
        let mut sheet = Sheet::new("S");
        assert!(sheet.set(CellRef::new(0, 1), CellValue::Number(1.0)).is_err());
        assert!(sheet.set(CellRef::new(1, 0), CellValue::Number(1.0)).is_err());
        assert!(
            sheet
                .set(
                    CellRef::new(crate::excel::address::MAX_COLUMNS + 1, 1),
                    CellValue::Number(1.0)
                )
                .is_err()
        );
        assert_eq!(sheet.row_count(), 0);
    }

    #[test]
    fn test_clearing_does_not_grow() {
        let mut sheet = sample();
        sheet.set(CellRef::new(5, 10), CellValue::Empty).unwrap();
        assert_eq!(sheet.row_count(), 4);
        assert_eq!(sheet.column_count(), 2);

        sheet.set(CellRef::new(1, 2), CellValue::Empty).unwrap();
        assert_eq!(sheet.get(CellRef::new(1, 2)).unwrap(), &CellValue::Empty);
    }

    #[test]
    fn test_column_values_with_and_without_empties() {
        let sheet = sample();
        let all = sheet.column_values(2, true).unwrap();
        assert_eq!(
            all,
            vec![
                CellValue::from("Age"),
                CellValue::Number(30.0),
                CellValue::Empty,
                CellValue::Empty
            ]
        );
        let populated = sheet.column_values(1, false).unwrap();
        assert_eq!(
            populated,
            vec![
                CellValue::from("Name"),
                CellValue::from("Alice"),
                CellValue::from("Bob")
            ]
        );
        assert!(sheet.column_values(3, true).is_err());
    }

    #[test]
    fn test_row_values_padded_to_width() {
        let sheet = sample();
        assert_eq!(
            sheet.row_values(4, true).unwrap(),
            vec![CellValue::from("Bob"), CellValue::Empty]
        );
        assert_eq!(sheet.row_values(3, false).unwrap(), Vec::<CellValue>::new());
        assert!(sheet.row_values(0, true).is_err());
    }

    #[test]
    fn test_named_values_row_major() {
        let sheet = sample();
        let values = sheet.named_values(false);
        let names: Vec<&str> = values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A1", "B1", "A2", "B2", "A4"]);
        assert_eq!(sheet.named_values(true).len(), 8);
    }

    #[test]
    fn test_cells_skip_empties() {
        let sheet = sample();
        assert_eq!(sheet.cells().count(), 5);
    }

    #[test]
    fn test_width_tracks_widest_row() {
        let rows = vec![
            vec![CellValue::from("a")],
            vec![CellValue::Empty, CellValue::Empty, CellValue::from("c")],
        ];
        let mut sheet = Sheet::from_rows("Loaded".to_string(), rows);
        assert_eq!(sheet.column_count(), 3);
        assert_eq!(sheet.get(CellRef::new(3, 1)).unwrap(), &CellValue::Empty);

        sheet.set(CellRef::new(7, 1), CellValue::Number(1.0)).unwrap();
        assert_eq!(sheet.column_count(), 7);
        sheet.set(CellRef::new(7, 1), CellValue::Empty).unwrap();
        assert_eq!(sheet.column_count(), 7);
    }

    #[test]
    fn test_sparse_sheet_reads_and_lists() {
        let mut sheet = Sheet::new("Sparse");
        sheet.set(CellRef::new(500, 1), "far".into()).unwrap();
        sheet.set(CellRef::new(1, 20_000), "deep".into()).unwrap();

        assert_eq!(sheet.column_count(), 500);
        assert_eq!(sheet.row_count(), 20_000);
        for row in 1..=20_000 {
            assert!(sheet.get(CellRef::new(1, row)).is_ok());
        }

        let values = sheet.named_values(false);
        assert_eq!(
            values,
            vec![
                ("SF1".to_string(), CellValue::from("far")),
                ("A20000".to_string(), CellValue::from("deep")),
            ]
        );
    }

    #[test]
    fn test_writing_a_value_drops_the_formula() {
        let mut sheet = sample();
        let cell = CellRef::new(2, 2);
        sheet.set_formula(cell, "A2*2");
        assert_eq!(sheet.formula(cell), Some("A2*2"));
        assert_eq!(sheet.formulas().count(), 1);

        sheet.set(cell, CellValue::Number(5.0)).unwrap();
        assert_eq!(sheet.formula(cell), None);
        assert_eq!(sheet.get(cell).unwrap(), &CellValue::Number(5.0));
    }
}
