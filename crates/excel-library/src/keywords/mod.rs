pub mod metadata;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ExcelError, Result};
use crate::excel::value::CellValue;
use crate::excel::{ExcelLibrary, SheetValues};
pub use metadata::{ArgDef, Keyword, KeywordMetadata};

/// What a keyword hands back to the runner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeywordValue {
    None,
    Integer(usize),
    Cell(CellValue),
    Text(String),
    Texts(Vec<String>),
    Cells(Vec<CellValue>),
    NamedCells(SheetValues),
    Workbook(IndexMap<String, SheetValues>),
}

/// Runs keywords by name against an [`ExcelLibrary`], coercing the string
/// arguments a table-driven runner passes in.
#[derive(Debug, Default)]
pub struct KeywordLibrary {
    library: ExcelLibrary,
}

impl KeywordLibrary {
    #[must_use]
    pub const fn new(library: ExcelLibrary) -> Self {
        Self { library }
    }

    #[must_use]
    pub const fn library(&self) -> &ExcelLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut ExcelLibrary {
        &mut self.library
    }

    pub fn run_keyword<S: AsRef<str>>(&mut self, name: &str, args: &[S]) -> Result<KeywordValue> {
        let keyword =
            Keyword::from_name(name).ok_or_else(|| ExcelError::UnknownKeyword(name.to_string()))?;
        let args = bind_args(keyword, args)?;
        log::debug!("Running keyword '{}' with {:?}", keyword.name(), args);
        let args = Args {
            meta: keyword.metadata(),
            values: &args,
        };
        self.dispatch(keyword, &args)
    }

    fn dispatch(&mut self, keyword: Keyword, args: &Args<'_>) -> Result<KeywordValue> {
        let lib = &mut self.library;
        let value = match keyword {
            Keyword::OpenExcel => {
                lib.open_excel(args.text(0), args.flag(1)?)?;
                KeywordValue::None
            }
            Keyword::OpenExcelCurrentDirectory => {
                lib.open_excel_current_directory(args.text(0))?;
                KeywordValue::None
            }
            Keyword::CloseExcel => {
                lib.close_excel()?;
                KeywordValue::None
            }
            Keyword::GetSheetNames => KeywordValue::Texts(lib.get_sheet_names()?),
            Keyword::GetNumberOfSheets => KeywordValue::Integer(lib.get_number_of_sheets()?),
            Keyword::GetColumnCount => KeywordValue::Integer(lib.get_column_count(args.text(0))?),
            Keyword::GetRowCount => KeywordValue::Integer(lib.get_row_count(args.text(0))?),
            Keyword::GetColumnValues => KeywordValue::Cells(lib.get_column_values(
                args.text(0),
                args.text(1),
                args.flag(2)?,
            )?),
            Keyword::GetRowValues => KeywordValue::Cells(lib.get_row_values(
                args.text(0),
                args.index(1)?,
                args.flag(2)?,
            )?),
            Keyword::GetSheetValues => {
                KeywordValue::NamedCells(lib.get_sheet_values(args.text(0), args.flag(1)?)?)
            }
            Keyword::GetWorkbookValues => {
                KeywordValue::Workbook(lib.get_workbook_values(args.flag(0)?)?)
            }
            Keyword::ReadCellDataByName => {
                KeywordValue::Cell(lib.read_cell_data_by_name(args.text(0), args.text(1))?)
            }
            Keyword::ReadCellDataByCoordinates => KeywordValue::Cell(
                lib.read_cell_data_by_coordinates(args.text(0), args.index(1)?, args.index(2)?)?,
            ),
            Keyword::CheckCellType => {
                let cell_type =
                    lib.check_cell_type(args.text(0), args.index(1)?, args.index(2)?)?;
                KeywordValue::Text(cell_type.to_string())
            }
            Keyword::PutValueToCell => {
                lib.put_value_to_cell(
                    args.text(0),
                    args.index(1)?,
                    args.index(2)?,
                    CellValue::infer(args.text(3)),
                )?;
                KeywordValue::None
            }
            Keyword::PutNumberToCell => {
                lib.put_number_to_cell(
                    args.text(0),
                    args.index(1)?,
                    args.index(2)?,
                    args.number(3)?,
                )?;
                KeywordValue::None
            }
            Keyword::PutStringToCell => {
                lib.put_string_to_cell(
                    args.text(0),
                    args.index(1)?,
                    args.index(2)?,
                    args.text(3),
                )?;
                KeywordValue::None
            }
            Keyword::SaveExcel => {
                lib.save_excel(args.text(0), args.flag(1)?)?;
                KeywordValue::None
            }
            Keyword::Save => {
                lib.save()?;
                KeywordValue::None
            }
            Keyword::SaveExcelCurrentDirectory => {
                lib.save_excel_current_directory(args.text(0))?;
                KeywordValue::None
            }
        };
        Ok(value)
    }
}

/// Checks the argument count and fills in defaults for trailing optionals.
fn bind_args<S: AsRef<str>>(keyword: Keyword, args: &[S]) -> Result<Vec<String>> {
    let meta = keyword.metadata();
    let required = meta.required_args();
    let total = meta.args.len();
    if args.len() < required || args.len() > total {
        let expected = if required == total {
            total.to_string()
        } else {
            format!("{required} to {total}")
        };
        return Err(ExcelError::ArgumentCount {
            keyword: meta.name.to_string(),
            expected,
            got: args.len(),
        });
    }

    let mut bound: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
    bound.extend(
        meta.args[args.len()..]
            .iter()
            .filter_map(|a| a.default.map(str::to_string)),
    );
    Ok(bound)
}

/// Positional access to bound arguments; coercion errors carry the
/// keyword's argument name.
struct Args<'a> {
    meta: &'static KeywordMetadata,
    values: &'a [String],
}

impl Args<'_> {
    fn text(&self, i: usize) -> &str {
        self.values.get(i).map_or("", String::as_str)
    }

    fn invalid(&self, i: usize) -> ExcelError {
        ExcelError::InvalidArgument {
            name: self.meta.args.get(i).map_or("", |a| a.name).to_string(),
            value: self.text(i).to_string(),
        }
    }

    fn index(&self, i: usize) -> Result<usize> {
        parse_index(self.text(i)).ok_or_else(|| self.invalid(i))
    }

    fn number(&self, i: usize) -> Result<f64> {
        self.text(i)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.invalid(i))
    }

    fn flag(&self, i: usize) -> Result<bool> {
        parse_bool(self.text(i)).ok_or_else(|| self.invalid(i))
    }
}

/// Row and column numbers arrive as text; `"3"` and `"3.0"` both mean 3.
/// Indexes are 1-based, so zero is rejected.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_index(s: &str) -> Option<usize> {
    let s = s.trim();
    s.parse::<usize>()
        .ok()
        .or_else(|| {
            s.parse::<f64>()
                .ok()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= 1e15)
                .map(|f| f as usize)
        })
        .filter(|i| *i > 0)
}

/// Accepts `True`/`False`, `yes`/`no`, `1`/`0`, optionally wrapped as `${True}`.
#[must_use]
pub fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    let s = s
        .strip_prefix("${")
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(s);
    match s.to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" | "" | "none" => Some(false),
        _ => None,
    }
}
