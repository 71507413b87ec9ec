use calamine::{DataType, Range, Reader, Xlsx, XlsxError, open_workbook};
use indexmap::IndexMap;
use rust_xlsxwriter::{
    ColNum, Format, Formula, RowNum, Workbook as XlsxWriter, Worksheet, XlsxError as WriteError,
};
use std::path::Path;

use crate::error::{ExcelError, Result};
use crate::excel::address::CellRef;
use crate::excel::scan::{self, Extent};
use crate::excel::sheet::Sheet;
use crate::excel::value::CellValue;

pub const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Largest sheet extent, in cells, that is loaded. The reader lays every
/// sheet out densely, so a sparse sheet costs as much as a full one.
pub const MAX_LOADED_CELLS: usize = 4_000_000;

const ERROR_CODES: [&str; 8] = [
    "#DIV/0!",
    "#N/A",
    "#NAME?",
    "#NULL!",
    "#NUM!",
    "#REF!",
    "#VALUE!",
    "#GETTING_DATA",
];

/// An in-memory workbook: sheets in document order, values only.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    sheets: IndexMap<String, Sheet>,
}

impl Workbook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ExcelError::FileNotFound(path.to_path_buf()));
        }

        let mut reader: Xlsx<_> =
            open_workbook(path).map_err(|e: XlsxError| parse_error(path, &e))?;
        let names = reader.sheet_names().to_vec();
        let extents = scan::sheet_extents(path)?;

        let mut sheets = IndexMap::with_capacity(names.len());
        for (index, name) in names.into_iter().enumerate() {
            if let Some(Some(extent)) = extents.get(&name) {
                check_extent(path, &name, extent)?;
            }

            let rows = match reader.worksheet_range_at(index) {
                Some(Ok(range)) => range_to_rows(&range),
                Some(Err(e)) => return Err(parse_error(path, &e)),
                None => Vec::new(),
            };
            let mut sheet = Sheet::from_rows(name.clone(), rows);

            match reader.worksheet_formula(&name) {
                Some(Ok(formulas)) => attach_formulas(&mut sheet, &formulas),
                Some(Err(e)) => return Err(parse_error(path, &e)),
                None => {}
            }
            sheets.insert(name, sheet);
        }

        Ok(Self { sheets })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = XlsxWriter::new();
        let datetime_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);

        for sheet in self.sheets.values() {
            let worksheet = writer.add_worksheet();
            worksheet
                .set_name(sheet.name())
                .map_err(|e| save_error(path, &e))?;
            for (cell, value) in sheet.cells() {
                if sheet.formula(cell).is_none() {
                    write_cell(worksheet, cell, value, &datetime_format)
                        .map_err(|e| save_error(path, &e))?;
                }
            }
            for (cell, formula) in sheet.formulas() {
                let cached = sheet.get(cell).ok();
                write_formula_cell(worksheet, cell, formula, cached, &datetime_format)
                    .map_err(|e| save_error(path, &e))?;
            }
        }

        writer.save(path).map_err(|e| save_error(path, &e))
    }

    #[must_use]
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.keys().cloned().collect()
    }

    #[must_use]
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .get(name)
            .ok_or_else(|| ExcelError::SheetNotFound(name.to_string()))
    }

    pub fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| ExcelError::SheetNotFound(name.to_string()))
    }

    pub fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.values()
    }

    pub fn add_sheet<S: Into<String>>(&mut self, name: S) -> Result<&mut Sheet> {
        let name = name.into();
        if self.sheets.contains_key(&name) {
            return Err(ExcelError::DuplicateSheet(name));
        }
        Ok(self
            .sheets
            .entry(name.clone())
            .or_insert_with(|| Sheet::new(name)))
    }
}

/// Lays a calamine range out from `A1`, dropping trailing empty cells and
/// rows so the extent covers populated cells only.
fn range_to_rows(range: &Range<DataType>) -> Vec<Vec<CellValue>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for cells in range.rows() {
        let mut row = vec![CellValue::Empty; start_col as usize];
        row.extend(cells.iter().map(CellValue::from));
        while row.last().is_some_and(CellValue::is_empty) {
            row.pop();
        }
        rows.push(row);
    }
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }
    rows
}

fn check_extent(path: &Path, sheet: &str, extent: &Extent) -> Result<()> {
    if extent.cell_count() > MAX_LOADED_CELLS {
        return Err(ExcelError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "sheet '{sheet}' spans {}:{} ({} rows x {} columns), more than {MAX_LOADED_CELLS} cells",
                extent.top_left,
                extent.bottom_right,
                extent.rows(),
                extent.columns()
            ),
        });
    }
    Ok(())
}

/// Formula ranges are positioned like value ranges: absolute start plus
/// relative offsets.
fn attach_formulas(sheet: &mut Sheet, formulas: &Range<String>) {
    let Some((start_row, start_col)) = formulas.start() else {
        return;
    };
    for (row, col, formula) in formulas.used_cells() {
        let cell = CellRef::new(start_col as usize + col + 1, start_row as usize + row + 1);
        sheet.set_formula(cell, formula.as_str());
    }
}

fn position(cell: CellRef) -> std::result::Result<(RowNum, ColNum), WriteError> {
    let row = RowNum::try_from(cell.row - 1).map_err(|_| WriteError::RowColumnLimitError)?;
    let col = ColNum::try_from(cell.column - 1).map_err(|_| WriteError::RowColumnLimitError)?;
    Ok((row, col))
}

/// Text Excel stores as a formula's cached result.
fn formula_result(value: &CellValue) -> Option<String> {
    match value {
        CellValue::String(s) | CellValue::Error(s) => Some(s.clone()),
        CellValue::Number(n) | CellValue::DateTime(n) => Some(n.to_string()),
        CellValue::Bool(true) => Some("TRUE".to_string()),
        CellValue::Bool(false) => Some("FALSE".to_string()),
        CellValue::Empty => None,
    }
}

fn write_formula_cell(
    worksheet: &mut Worksheet,
    cell: CellRef,
    formula: &str,
    cached: Option<&CellValue>,
    datetime_format: &Format,
) -> std::result::Result<(), WriteError> {
    let (row, col) = position(cell)?;
    let mut formula = Formula::new(formula);
    if let Some(result) = cached.and_then(formula_result) {
        formula = formula.set_result(result);
    }
    if matches!(cached, Some(CellValue::DateTime(_))) {
        worksheet.write_formula_with_format(row, col, formula, datetime_format)?;
    } else {
        worksheet.write_formula(row, col, formula)?;
    }
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    cell: CellRef,
    value: &CellValue,
    datetime_format: &Format,
) -> std::result::Result<(), WriteError> {
    let (row, col) = position(cell)?;

    match value {
        CellValue::String(s) if s.is_empty() => {}
        CellValue::String(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(serial) => {
            worksheet.write_number_with_format(row, col, *serial, datetime_format)?;
        }
        CellValue::Error(code) if ERROR_CODES.contains(&code.as_str()) => {
            // Error literals read back as errors.
            let formula = Formula::new(code.as_str()).set_result(code.as_str());
            worksheet.write_formula(row, col, formula)?;
        }
        CellValue::Error(text) => {
            log::warn!("Writing unknown error value {text} at {cell} as text");
            worksheet.write_string(row, col, text.as_str())?;
        }
        CellValue::Empty => {}
    }
    Ok(())
}

pub(crate) fn parse_error(path: &Path, error: &impl std::fmt::Display) -> ExcelError {
    ExcelError::Parse {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

fn save_error(path: &Path, error: &WriteError) -> ExcelError {
    ExcelError::Save {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}
