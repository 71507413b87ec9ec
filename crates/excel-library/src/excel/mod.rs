pub mod address;
pub mod scan;
pub mod sheet;
pub mod value;
pub mod workbook;

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

use crate::config::{LibraryConfig, PathMode};
use crate::error::{ExcelError, Result};
use address::CellRef;
use sheet::Sheet;
use value::{CellType, CellValue};
use workbook::Workbook;

pub type SheetValues = Vec<(String, CellValue)>;

/// Keyword-style access to a single open Excel workbook.
///
/// Every accessor requires a workbook opened with one of the `open_*`
/// operations. Mutations stay in memory until one of the `save*` operations
/// writes them out. A failing operation leaves the session as it was.
#[derive(Debug, Default)]
pub struct ExcelLibrary {
    config: LibraryConfig,
    workbook: Option<Workbook>,
    file_name: Option<PathBuf>,
    sheet_names: Vec<String>,
}

impl ExcelLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: LibraryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn config(&self) -> &LibraryConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.workbook.is_some()
    }

    /// Path the current workbook was opened from.
    #[must_use]
    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// Sheet names as they were when the workbook was opened.
    #[must_use]
    pub fn cached_sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    fn workbook(&self) -> Result<&Workbook> {
        self.workbook.as_ref().ok_or(ExcelError::NoWorkbookOpen)
    }

    fn workbook_mut(&mut self) -> Result<&mut Workbook> {
        self.workbook.as_mut().ok_or(ExcelError::NoWorkbookOpen)
    }

    fn sheet(&self, sheet_name: &str) -> Result<&Sheet> {
        self.workbook()?.sheet(sheet_name)
    }

    /// Opens the file at `filename`, or `filename` inside the configured
    /// temp directory when `use_temp_dir` is set.
    pub fn open_excel<P: AsRef<Path>>(&mut self, filename: P, use_temp_dir: bool) -> Result<()> {
        let path = self
            .config
            .resolve(filename, PathMode::from_temp_flag(use_temp_dir))?;
        self.open_resolved(path)
    }

    /// Opens `filename` relative to the working directory.
    pub fn open_excel_current_directory<P: AsRef<Path>>(&mut self, filename: P) -> Result<()> {
        let path = self.config.resolve(filename, PathMode::WorkingDir)?;
        self.open_resolved(path)
    }

    fn open_resolved(&mut self, path: PathBuf) -> Result<()> {
        log::info!("Opening file at {}", path.display());
        let workbook = Workbook::load(&path)?;
        self.sheet_names = workbook.sheet_names();
        self.workbook = Some(workbook);
        self.file_name = Some(path);
        Ok(())
    }

    /// Releases the open workbook without saving it.
    pub fn close_excel(&mut self) -> Result<()> {
        self.workbook()?;
        if let Some(path) = self.file_name.take() {
            log::info!("Closing workbook {}", path.display());
        }
        self.workbook = None;
        self.sheet_names.clear();
        Ok(())
    }

    pub fn get_sheet_names(&self) -> Result<Vec<String>> {
        Ok(self.workbook()?.sheet_names())
    }

    pub fn get_number_of_sheets(&self) -> Result<usize> {
        Ok(self.workbook()?.sheet_count())
    }

    pub fn get_column_count(&self, sheet_name: &str) -> Result<usize> {
        Ok(self.sheet(sheet_name)?.column_count())
    }

    pub fn get_row_count(&self, sheet_name: &str) -> Result<usize> {
        Ok(self.sheet(sheet_name)?.row_count())
    }

    /// Values of a column given as letters (`B`) or a 1-based index (`2`).
    pub fn get_column_values(
        &self,
        sheet_name: &str,
        column: &str,
        include_empty: bool,
    ) -> Result<Vec<CellValue>> {
        let sheet = self.sheet(sheet_name)?;
        let column = address::parse_column(column)?;
        sheet.column_values(column, include_empty)
    }

    pub fn get_row_values(
        &self,
        sheet_name: &str,
        row: usize,
        include_empty: bool,
    ) -> Result<Vec<CellValue>> {
        self.sheet(sheet_name)?.row_values(row, include_empty)
    }

    pub fn get_sheet_values(&self, sheet_name: &str, include_empty: bool) -> Result<SheetValues> {
        Ok(self.sheet(sheet_name)?.named_values(include_empty))
    }

    pub fn get_workbook_values(&self, include_empty: bool) -> Result<IndexMap<String, SheetValues>> {
        Ok(self
            .workbook()?
            .sheets()
            .map(|sheet| (sheet.name().to_string(), sheet.named_values(include_empty)))
            .collect())
    }

    pub fn read_cell_data_by_name(&self, sheet_name: &str, cell_name: &str) -> Result<CellValue> {
        let sheet = self.sheet(sheet_name)?;
        let cell = CellRef::parse(cell_name)?;
        sheet.get(cell).cloned()
    }

    pub fn read_cell_data_by_coordinates(
        &self,
        sheet_name: &str,
        column: usize,
        row: usize,
    ) -> Result<CellValue> {
        self.sheet(sheet_name)?
            .get(CellRef::new(column, row))
            .cloned()
    }

    pub fn check_cell_type(&self, sheet_name: &str, column: usize, row: usize) -> Result<CellType> {
        Ok(self
            .sheet(sheet_name)?
            .get(CellRef::new(column, row))?
            .cell_type())
    }

    pub fn put_value_to_cell<V: Into<CellValue>>(
        &mut self,
        sheet_name: &str,
        column: usize,
        row: usize,
        value: V,
    ) -> Result<()> {
        let value = value.into();
        let cell = CellRef::new(column, row);
        log::debug!("Putting {value:?} into {sheet_name}!{cell}");
        self.workbook_mut()?.sheet_mut(sheet_name)?.set(cell, value)
    }

    pub fn put_number_to_cell(
        &mut self,
        sheet_name: &str,
        column: usize,
        row: usize,
        value: f64,
    ) -> Result<()> {
        self.put_value_to_cell(sheet_name, column, row, CellValue::Number(value))
    }

    pub fn put_string_to_cell(
        &mut self,
        sheet_name: &str,
        column: usize,
        row: usize,
        value: &str,
    ) -> Result<()> {
        self.put_value_to_cell(sheet_name, column, row, CellValue::String(value.to_string()))
    }

    /// Saves to `filename`, or to `filename` inside the configured temp
    /// directory when `use_temp_dir` is set.
    pub fn save_excel<P: AsRef<Path>>(&self, filename: P, use_temp_dir: bool) -> Result<()> {
        let workbook = self.workbook()?;
        let path = self
            .config
            .resolve(filename, PathMode::from_temp_flag(use_temp_dir))?;
        save_to(workbook, &path)
    }

    /// Saves back to the file the workbook was opened from.
    pub fn save(&self) -> Result<()> {
        let workbook = self.workbook()?;
        let path = self.file_name.as_deref().ok_or(ExcelError::NoWorkbookOpen)?;
        save_to(workbook, path)
    }

    pub fn save_excel_current_directory<P: AsRef<Path>>(&self, filename: P) -> Result<()> {
        let workbook = self.workbook()?;
        let path = self.config.resolve(filename, PathMode::WorkingDir)?;
        save_to(workbook, &path)
    }
}

fn save_to(workbook: &Workbook, path: &Path) -> Result<()> {
    log::info!("Saving workbook to {}", path.display());
    workbook.save(path)
}
