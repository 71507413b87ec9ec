use excel_library::{KeywordLibrary, KeywordValue};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

pub const PLACEHOLDER_OPEN: char = '{';
pub const PLACEHOLDER_CLOSE: char = '}';

#[derive(Debug, Clone, Deserialize)]
pub struct Suite {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub keyword: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// `null` is a real expectation (an empty cell), so a present `null`
    /// must stay distinct from a missing field.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub expect: Option<Value>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    Passed,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub keyword: String,
    pub status: StepStatus,
    pub value: Option<KeywordValue>,
}

pub fn load_suite(path: &Path) -> Result<Suite, String> {
    if path.extension().and_then(|s| s.to_str()) != Some("json") {
        return Err(format!(
            "Invalid file extension: expected .json, got {:?}",
            path
        ));
    }

    let contents =
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;

    serde_json::from_str::<Suite>(&contents).map_err(|e| format!("Failed to parse suite: {}", e))
}

/// Runs steps in order. After the first failure the remaining steps are
/// reported as skipped.
pub fn run_suite(
    suite: &Suite,
    keywords: &mut KeywordLibrary,
    vars: &IndexMap<String, String>,
) -> Vec<StepResult> {
    let mut results = Vec::with_capacity(suite.steps.len());
    let mut failed = false;

    for step in &suite.steps {
        if failed {
            results.push(StepResult {
                keyword: step.keyword.clone(),
                status: StepStatus::Skipped,
                value: None,
            });
            continue;
        }

        let result = match run_step(step, keywords, vars) {
            Ok(value) => StepResult {
                keyword: step.keyword.clone(),
                status: StepStatus::Passed,
                value: Some(value),
            },
            Err(message) => {
                failed = true;
                log::error!("{}: {}", step.keyword, message);
                StepResult {
                    keyword: step.keyword.clone(),
                    status: StepStatus::Failed(message),
                    value: None,
                }
            }
        };
        results.push(result);
    }

    results
}

fn run_step(
    step: &Step,
    keywords: &mut KeywordLibrary,
    vars: &IndexMap<String, String>,
) -> Result<KeywordValue, String> {
    let args: Vec<String> = step.args.iter().map(|arg| substitute(arg, vars)).collect();
    let value = keywords
        .run_keyword(&step.keyword, &args)
        .map_err(|e| e.to_string())?;

    if let Some(expected) = &step.expect {
        let actual = serde_json::to_value(&value).map_err(|e| e.to_string())?;
        if !values_match(&actual, expected) {
            return Err(format!("expected {}, got {}", expected, actual));
        }
    }

    Ok(value)
}

/// Replaces `{NAME}` placeholders with variable values.
pub fn substitute(arg: &str, vars: &IndexMap<String, String>) -> String {
    let mut result = arg.to_string();
    for (name, value) in vars {
        let placeholder = format!("{PLACEHOLDER_OPEN}{name}{PLACEHOLDER_CLOSE}");
        result = result.replace(&placeholder, value);
    }
    result
}

/// JSON equality with numbers compared by value, so `2` matches `2.0`.
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_match(x, y)))
        }
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excel_library::{CellRef, ExcelLibrary, LibraryConfig, Workbook};
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn suite(steps: Value) -> Suite {
        serde_json::from_value(json!({ "name": "test", "steps": steps })).unwrap()
    }

    #[test]
    fn test_substitute_placeholders() {
        let vars = vars(&[("DIR", "/data"), ("SHEET", "Sheet1")]);
        assert_eq!(substitute("{DIR}/book.xlsx", &vars), "/data/book.xlsx");
        assert_eq!(substitute("{SHEET}", &vars), "Sheet1");
        assert_eq!(substitute("{OTHER}", &vars), "{OTHER}");
    }

    #[test]
    fn test_values_match_numbers_by_value() {
        assert!(values_match(&json!(2.0), &json!(2)));
        assert!(values_match(&json!(["a", 1.0, null]), &json!(["a", 1, null])));
        assert!(!values_match(&json!([1.0]), &json!([1, 2])));
        assert!(!values_match(&json!("1"), &json!(1)));
        assert!(values_match(&json!({"S": [1.0]}), &json!({"S": [1]})));
    }

    #[test]
    fn test_expect_null_is_kept() {
        let suite = suite(json!([
            { "keyword": "Save" },
            { "keyword": "Read Cell Data By Name", "args": ["S", "A1"], "expect": null }
        ]));
        assert_eq!(suite.steps[0].expect, None);
        assert_eq!(suite.steps[1].expect, Some(Value::Null));
    }

    #[test]
    fn test_load_suite_rejects_other_extensions() {
        let err = load_suite(Path::new("suite.txt")).unwrap_err();
        assert!(err.contains("expected .json"));
    }

    #[test]
    fn test_failure_skips_remaining_steps() {
        let suite = suite(json!([
            { "keyword": "Get Number Of Sheets" },
            { "keyword": "Get Sheet Names" }
        ]));
        let mut keywords = KeywordLibrary::default();
        let results = run_suite(&suite, &mut keywords, &IndexMap::new());

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].status,
            StepStatus::Failed("No workbook is open".to_string())
        );
        assert_eq!(results[1].status, StepStatus::Skipped);
    }

    #[test]
    fn test_suite_against_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let mut workbook = Workbook::new();
        workbook
            .add_sheet("Sheet1")
            .unwrap()
            .set(CellRef::new(1, 1), "Hello".into())
            .unwrap();
        workbook.add_sheet("Sheet2").unwrap();
        workbook.save(dir.path().join("Book1.xlsx")).unwrap();

        let suite = suite(json!([
            { "keyword": "Open Excel", "args": ["{DIR}/Book1.xlsx"] },
            { "keyword": "Get Sheet Names", "expect": ["Sheet1", "Sheet2"] },
            { "keyword": "Get Number Of Sheets", "expect": 2 },
            { "keyword": "Put Number To Cell", "args": ["Sheet1", "2", "1", "7"] },
            { "keyword": "Get Row Values", "args": ["Sheet1", "1"], "expect": ["Hello", 7] },
            { "keyword": "Save Excel", "args": ["Out.xlsx", "True"] },
            { "keyword": "Open Excel", "args": ["Out.xlsx", "True"] },
            { "keyword": "Read Cell Data By Coordinates", "args": ["Sheet1", "2", "1"], "expect": 7 }
        ]));
        let dir_str = dir.path().to_string_lossy().to_string();
        let vars = vars(&[("DIR", dir_str.as_str())]);
        let config = LibraryConfig::new().with_temp_dir(dir.path());
        let mut keywords = KeywordLibrary::new(ExcelLibrary::with_config(config));

        let results = run_suite(&suite, &mut keywords, &vars);
        for result in &results {
            assert_eq!(result.status, StepStatus::Passed, "{}", result.keyword);
        }
    }

    #[test]
    fn test_expectation_mismatch_fails_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut workbook = Workbook::new();
        workbook.add_sheet("Only").unwrap();
        let path = dir.path().join("Book.xlsx");
        workbook.save(&path).unwrap();

        let suite = suite(json!([
            { "keyword": "Open Excel", "args": [path.to_string_lossy()] },
            { "keyword": "Get Number Of Sheets", "expect": 3 }
        ]));
        let mut keywords = KeywordLibrary::default();
        let results = run_suite(&suite, &mut keywords, &IndexMap::new());

        assert_eq!(results[0].status, StepStatus::Passed);
        assert_eq!(
            results[1].status,
            StepStatus::Failed("expected 3, got 1".to_string())
        );
    }
}
