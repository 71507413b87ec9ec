use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExcelError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read Excel file {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Invalid cell reference: {0}")]
    InvalidCellReference(String),

    #[error("Cell out of range in sheet '{sheet}': column {column}, row {row}")]
    OutOfRange {
        sheet: String,
        column: usize,
        row: usize,
    },

    #[error("Failed to write Excel file {}: {message}", .path.display())]
    Save { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No workbook is open")]
    NoWorkbookOpen,

    #[error("Sheet already exists: {0}")]
    DuplicateSheet(String),

    #[error("Unknown keyword: {0}")]
    UnknownKeyword(String),

    #[error("Keyword '{keyword}' expected {expected} arguments, got {got}")]
    ArgumentCount {
        keyword: String,
        expected: String,
        got: usize,
    },

    #[error("Invalid value for argument '{name}': {value}")]
    InvalidArgument { name: String, value: String },
}

pub type Result<T> = std::result::Result<T, ExcelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_display() {
        let error = ExcelError::FileNotFound(PathBuf::from("/test/book.xlsx"));
        let msg = format!("{}", error);
        assert!(msg.contains("File not found"));
        assert!(msg.contains("book.xlsx"));
    }

    #[test]
    fn test_sheet_not_found_display() {
        let error = ExcelError::SheetNotFound("Sheet9".to_string());
        assert_eq!(error.to_string(), "Sheet not found: Sheet9");
    }

    #[test]
    fn test_out_of_range_display() {
        let error = ExcelError::OutOfRange {
            sheet: "Sheet1".to_string(),
            column: 3,
            row: 0,
        };
        assert_eq!(
            error.to_string(),
            "Cell out of range in sheet 'Sheet1': column 3, row 0"
        );
    }

    #[test]
    fn test_no_workbook_open_display() {
        assert_eq!(ExcelError::NoWorkbookOpen.to_string(), "No workbook is open");
    }

    #[test]
    fn test_argument_count_display() {
        let error = ExcelError::ArgumentCount {
            keyword: "Open Excel".to_string(),
            expected: "1 to 2".to_string(),
            got: 3,
        };
        assert_eq!(
            error.to_string(),
            "Keyword 'Open Excel' expected 1 to 2 arguments, got 3"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: ExcelError = io.into();
        assert!(matches!(error, ExcelError::Io(_)));
        assert!(error.to_string().starts_with("I/O error"));
    }
}
