use calamine::DataType;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Serialize, Serializer};
use std::fmt;

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single scalar cell value. `Empty` is the null marker.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date (days since 1899-12-30).
    DateTime(f64),
    Error(String),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    String,
    Number,
    Boolean,
    DateTime,
    Error,
    Empty,
}

impl CellType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::DateTime => "datetime",
            Self::Error => "error",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CellValue {
    #[must_use]
    pub const fn cell_type(&self) -> CellType {
        match self {
            Self::String(_) => CellType::String,
            Self::Number(_) => CellType::Number,
            Self::Bool(_) => CellType::Boolean,
            Self::DateTime(_) => CellType::DateTime,
            Self::Error(_) => CellType::Error,
            Self::Empty => CellType::Empty,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Guesses the value type of keyword input: booleans, then numbers,
    /// everything else is kept as text. Surrounding whitespace only matters
    /// for text.
    #[must_use]
    pub fn infer(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            Self::Bool(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Self::Bool(false)
        } else if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                Self::Number(n)
            } else {
                Self::String(s.to_string())
            }
        } else {
            Self::String(s.to_string())
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) | Self::DateTime(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Error(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(serial) => serial_to_datetime(*serial),
            _ => None,
        }
    }
}

#[must_use]
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    #[allow(clippy::cast_possible_truncation)]
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

#[must_use]
pub fn datetime_to_serial(datetime: NaiveDateTime) -> Option<f64> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    #[allow(clippy::cast_precision_loss)]
    let millis = (datetime - base).num_milliseconds() as f64;
    Some(millis / 86_400_000.0)
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Error(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{n:.0}")
                } else {
                    write!(f, "{n}")
                }
            }
            Self::DateTime(serial) => match serial_to_datetime(*serial) {
                Some(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
                None => write!(f, "{serial}"),
            },
            Self::Empty => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::String(s) | Self::Error(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::DateTime(_) => serializer.collect_str(self),
            Self::Empty => serializer.serialize_none(),
        }
    }
}

impl From<&DataType> for CellValue {
    fn from(data: &DataType) -> Self {
        match data {
            DataType::Empty => Self::Empty,
            DataType::String(s) | DataType::DateTimeIso(s) | DataType::DurationIso(s) => {
                Self::String(s.clone())
            }
            DataType::Float(f) | DataType::Duration(f) => Self::Number(*f),
            #[allow(clippy::cast_precision_loss)]
            DataType::Int(i) => Self::Number(*i as f64),
            DataType::Bool(b) => Self::Bool(*b),
            DataType::DateTime(serial) => Self::DateTime(*serial),
            DataType::Error(e) => Self::Error(e.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(datetime: NaiveDateTime) -> Self {
        datetime_to_serial(datetime).map_or(Self::Empty, Self::DateTime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_types() {
        assert_eq!(CellValue::infer("TRUE"), CellValue::Bool(true));
        assert_eq!(CellValue::infer("false"), CellValue::Bool(false));
        assert_eq!(CellValue::infer("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::infer("-1.5"), CellValue::Number(-1.5));
        assert_eq!(CellValue::infer("Hello"), CellValue::String("Hello".into()));
        assert_eq!(CellValue::infer("NaN"), CellValue::String("NaN".into()));
    }

    #[test]
    fn test_infer_ignores_surrounding_whitespace() {
        assert_eq!(CellValue::infer(" true "), CellValue::Bool(true));
        assert_eq!(CellValue::infer("\tFALSE"), CellValue::Bool(false));
        assert_eq!(CellValue::infer(" 42 "), CellValue::Number(42.0));
        assert_eq!(CellValue::infer(" hi "), CellValue::String(" hi ".into()));
    }

    #[test]
    fn test_display_drops_integral_fraction() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(2.25).to_string(), "2.25");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert_eq!(CellValue::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_datetime_serial_conversion() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let value = CellValue::from(dt);
        assert_eq!(value.cell_type(), CellType::DateTime);
        assert_eq!(value.as_datetime(), Some(dt));
        assert_eq!(value.to_string(), "2024-03-01 12:30:00");
    }

    #[test]
    fn test_known_serial_date() {
        // 45292 is 2024-01-01 in the 1900 date system.
        let dt = serial_to_datetime(45292.0).unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-01");
    }

    #[test]
    fn test_from_calamine_data() {
        assert_eq!(CellValue::from(&DataType::Int(7)), CellValue::Number(7.0));
        assert_eq!(
            CellValue::from(&DataType::String("x".into())),
            CellValue::String("x".into())
        );
        assert_eq!(CellValue::from(&DataType::Empty), CellValue::Empty);
        assert_eq!(
            CellValue::from(&DataType::Error(calamine::CellErrorType::Div0)),
            CellValue::Error("#DIV/0!".into())
        );
    }

    #[test]
    fn test_cell_type_names() {
        assert_eq!(CellValue::from("a").cell_type().to_string(), "string");
        assert_eq!(CellValue::from(1.0).cell_type().to_string(), "number");
        assert_eq!(CellValue::from(true).cell_type().to_string(), "boolean");
        assert_eq!(CellValue::Empty.cell_type().to_string(), "empty");
    }
}
