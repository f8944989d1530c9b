use crate::tabulate::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;
use std::fs;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "selectionName")]
    pub selection_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "selectionDate")]
    pub selection_date: Option<String>,
    #[serde(rename = "organization")]
    pub organization: Option<String>,
}

/// The configuration echo at the top of the JSON summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub selection: String,
    pub date: Option<String>,
    pub organization: Option<String>,
    #[serde(rename = "totalFieldWeight")]
    pub total_field_weight: u32,
    #[serde(rename = "totalProjects")]
    pub total_projects: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// The evaluation field this file scores.
    pub field: String,
    #[serde(rename = "projectColumnIndex")]
    _project_column_index: Option<JSValue>,
    #[serde(rename = "criterionColumnIndex")]
    _criterion_column_index: Option<JSValue>,
    #[serde(rename = "valueColumnIndex")]
    _value_column_index: Option<JSValue>,
    #[serde(rename = "firstScoreRowIndex")]
    _first_score_row_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    /// When set, the project column holds project codes instead of ids.
    #[serde(rename = "projectsByCode")]
    pub projects_by_code: Option<bool>,
}

impl FileSource {
    // All the column indices are 1-based in the configuration, following
    // the conventions of the spreadsheet world.
    pub fn project_column_index(&self) -> SelResult<usize> {
        match &self._project_column_index {
            None => Ok(0),
            Some(_) => Ok(read_js_int(&self._project_column_index)? - 1),
        }
    }

    pub fn criterion_column_index(&self) -> SelResult<usize> {
        match &self._criterion_column_index {
            None => Ok(1),
            Some(_) => Ok(read_js_int(&self._criterion_column_index)? - 1),
        }
    }

    pub fn value_column_index(&self) -> SelResult<usize> {
        match &self._value_column_index {
            None => Ok(2),
            Some(_) => Ok(read_js_int(&self._value_column_index)? - 1),
        }
    }

    /// The 1-based row of the first score. Defaults to 2: one header row.
    pub fn first_score_row_index(&self) -> SelResult<usize> {
        match &self._first_score_row_index {
            None => Ok(2),
            Some(_) => read_js_int(&self._first_score_row_index),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SelProject {
    pub id: u32,
    pub code: Option<String>,
    pub name: String,
    pub location: Option<String>,
    pub status: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SelCriterion {
    pub id: u32,
    pub name: String,
    pub weight: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SelField {
    pub name: String,
    /// The institutional weight of this field's vote in the consensus.
    pub weight: u32,
    pub criteria: Vec<SelCriterion>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SelConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "scoreFileSources")]
    pub score_file_sources: Vec<FileSource>,
    pub projects: Vec<SelProject>,
    pub fields: Vec<SelField>,
}

pub fn read_summary(path: String) -> SelResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> SelResult<usize> {
    match x {
        Some(JSValue::Number(n)) => n
            .as_u64()
            .map(|x| x as usize)
            .context(ParsingJsonNumberSnafu {}),
        // Spreadsheet-style column letters.
        Some(JSValue::String(s)) if s.chars().all(|c| c.is_alphabetic()) => {
            // Just treating the simple case for now. It should be expanded
            // to more than 26 columns.
            assert_eq!(s.chars().count(), 1);
            let c1: char = s.to_lowercase().chars().next().unwrap();
            Ok((c1 as usize) - ('a' as usize) + 1)
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok().context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_indices_default_to_the_csv_layout() {
        let source: FileSource = serde_json::from_str(
            r#"{ "provider": "csv", "filePath": "scores.csv", "field": "technical" }"#,
        )
        .unwrap();
        assert_eq!(source.project_column_index().unwrap(), 0);
        assert_eq!(source.criterion_column_index().unwrap(), 1);
        assert_eq!(source.value_column_index().unwrap(), 2);
        assert_eq!(source.first_score_row_index().unwrap(), 2);
    }

    #[test]
    fn column_indices_accept_numbers_strings_and_letters() {
        let source: FileSource = serde_json::from_str(
            r#"{
                "provider": "csv",
                "filePath": "scores.csv",
                "field": "technical",
                "projectColumnIndex": 2,
                "criterionColumnIndex": "3",
                "valueColumnIndex": "D",
                "firstScoreRowIndex": 1
            }"#,
        )
        .unwrap();
        assert_eq!(source.project_column_index().unwrap(), 1);
        assert_eq!(source.criterion_column_index().unwrap(), 2);
        assert_eq!(source.value_column_index().unwrap(), 3);
        assert_eq!(source.first_score_row_index().unwrap(), 1);
    }
}
