pub mod config;
pub mod error;
pub mod excel;
pub mod keywords;

pub use config::{LibraryConfig, PathMode};
pub use error::{ExcelError, Result};
pub use excel::address::CellRef;
pub use excel::value::{CellType, CellValue};
pub use excel::workbook::Workbook;
pub use excel::{ExcelLibrary, SheetValues};
pub use keywords::{Keyword, KeywordLibrary, KeywordValue};
