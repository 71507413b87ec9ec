#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgDef {
    pub name: &'static str,
    pub default: Option<&'static str>,
}

impl ArgDef {
    const fn required(name: &'static str) -> Self {
        Self {
            name,
            default: None,
        }
    }

    const fn optional(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default: Some(default),
        }
    }
}

#[non_exhaustive]
pub struct KeywordMetadata {
    pub name: &'static str,
    pub args: &'static [ArgDef],
    pub doc: &'static str,
}

impl KeywordMetadata {
    #[must_use]
    pub fn required_args(&self) -> usize {
        self.args.iter().filter(|a| a.default.is_none()).count()
    }

    /// `sheetname, column, row=1` style signature for listings.
    #[must_use]
    pub fn signature(&self) -> String {
        self.args
            .iter()
            .map(|arg| match arg.default {
                Some(default) => format!("{}={}", arg.name, default),
                None => arg.name.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    OpenExcel,
    OpenExcelCurrentDirectory,
    CloseExcel,
    GetSheetNames,
    GetNumberOfSheets,
    GetColumnCount,
    GetRowCount,
    GetColumnValues,
    GetRowValues,
    GetSheetValues,
    GetWorkbookValues,
    ReadCellDataByName,
    ReadCellDataByCoordinates,
    CheckCellType,
    PutValueToCell,
    PutNumberToCell,
    PutStringToCell,
    SaveExcel,
    Save,
    SaveExcelCurrentDirectory,
}

const ALL_KEYWORDS: [Keyword; 20] = [
    Keyword::OpenExcel,
    Keyword::OpenExcelCurrentDirectory,
    Keyword::CloseExcel,
    Keyword::GetSheetNames,
    Keyword::GetNumberOfSheets,
    Keyword::GetColumnCount,
    Keyword::GetRowCount,
    Keyword::GetColumnValues,
    Keyword::GetRowValues,
    Keyword::GetSheetValues,
    Keyword::GetWorkbookValues,
    Keyword::ReadCellDataByName,
    Keyword::ReadCellDataByCoordinates,
    Keyword::CheckCellType,
    Keyword::PutValueToCell,
    Keyword::PutNumberToCell,
    Keyword::PutStringToCell,
    Keyword::SaveExcel,
    Keyword::Save,
    Keyword::SaveExcelCurrentDirectory,
];

impl Keyword {
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &ALL_KEYWORDS
    }

    /// Looks a keyword up ignoring case, spaces and underscores.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        Self::all()
            .iter()
            .copied()
            .find(|keyword| normalize(keyword.metadata().name) == wanted)
    }

    #[must_use]
    pub fn metadata(&self) -> &'static KeywordMetadata {
        match self {
            Self::OpenExcel => &OPEN_EXCEL,
            Self::OpenExcelCurrentDirectory => &OPEN_EXCEL_CURRENT_DIRECTORY,
            Self::CloseExcel => &CLOSE_EXCEL,
            Self::GetSheetNames => &GET_SHEET_NAMES,
            Self::GetNumberOfSheets => &GET_NUMBER_OF_SHEETS,
            Self::GetColumnCount => &GET_COLUMN_COUNT,
            Self::GetRowCount => &GET_ROW_COUNT,
            Self::GetColumnValues => &GET_COLUMN_VALUES,
            Self::GetRowValues => &GET_ROW_VALUES,
            Self::GetSheetValues => &GET_SHEET_VALUES,
            Self::GetWorkbookValues => &GET_WORKBOOK_VALUES,
            Self::ReadCellDataByName => &READ_CELL_DATA_BY_NAME,
            Self::ReadCellDataByCoordinates => &READ_CELL_DATA_BY_COORDINATES,
            Self::CheckCellType => &CHECK_CELL_TYPE,
            Self::PutValueToCell => &PUT_VALUE_TO_CELL,
            Self::PutNumberToCell => &PUT_NUMBER_TO_CELL,
            Self::PutStringToCell => &PUT_STRING_TO_CELL,
            Self::SaveExcel => &SAVE_EXCEL,
            Self::Save => &SAVE,
            Self::SaveExcelCurrentDirectory => &SAVE_EXCEL_CURRENT_DIRECTORY,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.metadata().name
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

const SHEET: ArgDef = ArgDef::required("sheetname");
const COLUMN: ArgDef = ArgDef::required("column");
const ROW: ArgDef = ArgDef::required("row");
const VALUE: ArgDef = ArgDef::required("value");
const FILENAME: ArgDef = ArgDef::required("filename");
const USE_TEMP_DIR: ArgDef = ArgDef::optional("useTempDir", "False");
const INCLUDE_EMPTY: ArgDef = ArgDef::optional("includeEmptyCells", "True");

static OPEN_EXCEL: KeywordMetadata = KeywordMetadata {
    name: "Open Excel",
    args: &[FILENAME, USE_TEMP_DIR],
    doc: "Opens the Excel file at the given path. With useTempDir set, the file \
          name is looked up in the configured temp directory (Temp on Windows, \
          tmp elsewhere, unless overridden).\n\
          Example: | Open Excel | C:\\Python27\\ExcelRobotTest\\ExcelRobotTest.xlsx |",
};

static OPEN_EXCEL_CURRENT_DIRECTORY: KeywordMetadata = KeywordMetadata {
    name: "Open Excel Current Directory",
    args: &[FILENAME],
    doc: "Opens the Excel file relative to the directory the test run was started from.\n\
          Example: | Open Excel Current Directory | ExcelRobotTest.xlsx |",
};

static CLOSE_EXCEL: KeywordMetadata = KeywordMetadata {
    name: "Close Excel",
    args: &[],
    doc: "Releases the open workbook without saving it.",
};

static GET_SHEET_NAMES: KeywordMetadata = KeywordMetadata {
    name: "Get Sheet Names",
    args: &[],
    doc: "Returns the names of all the worksheets in the current workbook.\n\
          Example: | @{sheetNames} | Get Sheet Names |",
};

static GET_NUMBER_OF_SHEETS: KeywordMetadata = KeywordMetadata {
    name: "Get Number Of Sheets",
    args: &[],
    doc: "Returns the number of worksheets in the current workbook.\n\
          Example: | ${sheetNum} | Get Number Of Sheets |",
};

static GET_COLUMN_COUNT: KeywordMetadata = KeywordMetadata {
    name: "Get Column Count",
    args: &[SHEET],
    doc: "Returns the number of columns in the populated extent of the sheet.\n\
          Example: | ${colCount} | Get Column Count | TestSheet1 |",
};

static GET_ROW_COUNT: KeywordMetadata = KeywordMetadata {
    name: "Get Row Count",
    args: &[SHEET],
    doc: "Returns the number of rows in the populated extent of the sheet.\n\
          Example: | ${rowCount} | Get Row Count | TestSheet1 |",
};

static GET_COLUMN_VALUES: KeywordMetadata = KeywordMetadata {
    name: "Get Column Values",
    args: &[SHEET, ArgDef::required("columnname"), INCLUDE_EMPTY],
    doc: "Returns the values of a column, top to bottom. The column is given as \
          letters (B) or a 1-based index (2). Empty cells are returned as null \
          unless includeEmptyCells is False, in which case they are left out.\n\
          Example: | ${colValues} | Get Column Values | TestSheet1 | A |",
};

static GET_ROW_VALUES: KeywordMetadata = KeywordMetadata {
    name: "Get Row Values",
    args: &[SHEET, ROW, INCLUDE_EMPTY],
    doc: "Returns the values of a 1-based row, left to right. Empty cells are \
          returned as null unless includeEmptyCells is False.\n\
          Example: | ${rowValues} | Get Row Values | TestSheet1 | 1 |",
};

static GET_SHEET_VALUES: KeywordMetadata = KeywordMetadata {
    name: "Get Sheet Values",
    args: &[SHEET, INCLUDE_EMPTY],
    doc: "Returns [cell name, value] pairs for the whole sheet in row-major order.\n\
          Example: | ${sheetValues} | Get Sheet Values | TestSheet1 |",
};

static GET_WORKBOOK_VALUES: KeywordMetadata = KeywordMetadata {
    name: "Get Workbook Values",
    args: &[INCLUDE_EMPTY],
    doc: "Returns the sheet values of every sheet, keyed by sheet name.\n\
          Example: | ${workbookValues} | Get Workbook Values |",
};

static READ_CELL_DATA_BY_NAME: KeywordMetadata = KeywordMetadata {
    name: "Read Cell Data By Name",
    args: &[SHEET, ArgDef::required("cell_name")],
    doc: "Returns the value of the named cell, null when it is empty.\n\
          Example: | ${cellValue} | Read Cell Data By Name | TestSheet1 | A2 |",
};

static READ_CELL_DATA_BY_COORDINATES: KeywordMetadata = KeywordMetadata {
    name: "Read Cell Data By Coordinates",
    args: &[SHEET, COLUMN, ROW],
    doc: "Returns the value of the cell at the 1-based column and row.\n\
          Example: | ${cellValue} | Read Cell Data By Coordinates | TestSheet1 | 1 | 2 |",
};

static CHECK_CELL_TYPE: KeywordMetadata = KeywordMetadata {
    name: "Check Cell Type",
    args: &[SHEET, COLUMN, ROW],
    doc: "Returns the type of the cell value: string, number, boolean, datetime, \
          error or empty.\n\
          Example: | ${cellType} | Check Cell Type | TestSheet1 | 1 | 2 |",
};

static PUT_VALUE_TO_CELL: KeywordMetadata = KeywordMetadata {
    name: "Put Value To Cell",
    args: &[SHEET, COLUMN, ROW, VALUE],
    doc: "Sets the cell to the given value, stored as a boolean or number when it \
          reads as one and as text otherwise.\n\
          Example: | Put Value To Cell | TestSheet1 | 1 | 2 | 34 |",
};

static PUT_NUMBER_TO_CELL: KeywordMetadata = KeywordMetadata {
    name: "Put Number To Cell",
    args: &[SHEET, COLUMN, ROW, VALUE],
    doc: "Sets the cell to the given number.\n\
          Example: | Put Number To Cell | TestSheet1 | 1 | 2 | 34 |",
};

static PUT_STRING_TO_CELL: KeywordMetadata = KeywordMetadata {
    name: "Put String To Cell",
    args: &[SHEET, COLUMN, ROW, VALUE],
    doc: "Sets the cell to the given text.\n\
          Example: | Put String To Cell | TestSheet1 | 1 | 2 | Hello |",
};

static SAVE_EXCEL: KeywordMetadata = KeywordMetadata {
    name: "Save Excel",
    args: &[FILENAME, USE_TEMP_DIR],
    doc: "Saves the workbook to the given path, or inside the temp directory when \
          useTempDir is set.\n\
          Example: | Save Excel | NewExcelSheet.xlsx |",
};

static SAVE: KeywordMetadata = KeywordMetadata {
    name: "Save",
    args: &[],
    doc: "Saves the workbook back to the file it was opened from.",
};

static SAVE_EXCEL_CURRENT_DIRECTORY: KeywordMetadata = KeywordMetadata {
    name: "Save Excel Current Directory",
    args: &[FILENAME],
    doc: "Saves the workbook relative to the directory the test run was started from.\n\
          Example: | Save Excel Current Directory | WorkbookScenarioCreated.xlsx |",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_has_unique_name() {
        let mut names: Vec<String> = Keyword::all()
            .iter()
            .map(|k| normalize(k.name()))
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Keyword::all().len());
    }

    #[test]
    fn test_lookup_ignores_case_spaces_and_underscores() {
        assert_eq!(Keyword::from_name("Open Excel"), Some(Keyword::OpenExcel));
        assert_eq!(Keyword::from_name("open_excel"), Some(Keyword::OpenExcel));
        assert_eq!(
            Keyword::from_name("READCELLDATABYNAME"),
            Some(Keyword::ReadCellDataByName)
        );
        assert_eq!(Keyword::from_name("Save"), Some(Keyword::Save));
        assert_eq!(Keyword::from_name("Delete Excel"), None);
    }

    #[test]
    fn test_signature_lists_defaults() {
        assert_eq!(
            Keyword::GetColumnValues.metadata().signature(),
            "sheetname, columnname, includeEmptyCells=True"
        );
        assert_eq!(Keyword::OpenExcel.metadata().required_args(), 1);
        assert_eq!(Keyword::GetSheetNames.metadata().signature(), "");
    }

    #[test]
    fn test_optional_args_trail_required_ones() {
        for keyword in Keyword::all() {
            let args = keyword.metadata().args;
            let first_optional = args.iter().position(|a| a.default.is_some());
            if let Some(pos) = first_optional {
                assert!(
                    args[pos..].iter().all(|a| a.default.is_some()),
                    "{} has a required argument after an optional one",
                    keyword.name()
                );
            }
        }
    }
}
