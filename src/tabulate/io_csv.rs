// Primitives for reading CSV score files.

use std::fs::File;

use log::debug;
use snafu::prelude::*;

use crate::tabulate::{io_common::make_default_id, *};

pub fn read_csv_scores(path: String, cfs: &FileSource) -> SelResult<Vec<ParsedScoreRow>> {
    let default_id = make_default_id(path.as_str());

    let project_idx = cfs.project_column_index()?;
    let criterion_idx = cfs.criterion_column_index()?;
    let value_idx = cfs.value_column_index()?;

    let (records, row_offset) = get_records(&path, cfs)?;

    let mut res: Vec<ParsedScoreRow> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + row_offset;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_csv_scores: lineno: {:?} row: {:?}", lineno, line);

        let project = line
            .get(project_idx)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim()
            .to_string();
        let criterion = line
            .get(criterion_idx)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim()
            .to_string();
        let value_s = line
            .get(value_idx)
            .context(CsvLineTooShortSnafu { lineno })?
            .trim();
        if project.is_empty() && criterion.is_empty() && value_s.is_empty() {
            // Trailing blank line.
            continue;
        }
        if value_s.is_empty() {
            // The pair exists in the export but has not been scored yet.
            debug!(
                "read_csv_scores: lineno {:?}: no value for project {:?} criterion {:?}",
                lineno, project, criterion
            );
            continue;
        }
        let value = value_s
            .parse::<f64>()
            .ok()
            .context(CsvBadValueSnafu {
                lineno,
                content: value_s.to_string(),
            })?;

        res.push(ParsedScoreRow {
            id: Some(default_id(lineno)),
            project,
            criterion,
            value,
        });
    }
    Ok(res)
}

fn get_records(
    path: &String,
    cfs: &FileSource,
) -> SelResult<(csv::StringRecordsIntoIter<File>, usize)> {
    let first_row = cfs.first_score_row_index()?;
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu {})?;
    let mut records = rdr.into_records();
    // The index starts at 1 to respect most conventions in the spreadsheet
    // world.
    for _ in 1..first_row {
        _ = records.next();
    }
    Ok((records, first_row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_temp(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    #[test]
    fn reads_the_default_layout() {
        let path = write_temp(
            "prosel_io_csv_default.csv",
            "project,criterion,value\n1,1,4\n1,2,2\n2,1,5\n",
        );
        let cfs: FileSource = serde_json::from_str(
            r#"{ "provider": "csv", "filePath": "x", "field": "technical" }"#,
        )
        .unwrap();
        let rows = read_csv_scores(path, &cfs).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].project, "1");
        assert_eq!(rows[0].criterion, "1");
        assert_eq!(rows[0].value, 4.0);
        assert_eq!(rows[2].project, "2");
        assert_eq!(rows[2].value, 5.0);
    }

    #[test]
    fn skips_unscored_pairs_and_keeps_line_numbers() {
        let path = write_temp(
            "prosel_io_csv_blanks.csv",
            "project,criterion,value\n1,1,\n1,2,3\n",
        );
        let cfs: FileSource = serde_json::from_str(
            r#"{ "provider": "csv", "filePath": "x", "field": "technical" }"#,
        )
        .unwrap();
        let rows = read_csv_scores(path, &cfs).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].criterion, "2");
        // Row ids carry the 1-based line number of the source file.
        assert!(rows[0].id.as_ref().unwrap().ends_with("-00000003"));
    }

    #[test]
    fn relocated_columns_are_respected() {
        let path = write_temp(
            "prosel_io_csv_columns.csv",
            "evaluator,value,project,criterion\nalice,4,1,1\nalice,2,1,2\n",
        );
        let cfs: FileSource = serde_json::from_str(
            r#"{
                "provider": "csv",
                "filePath": "x",
                "field": "technical",
                "projectColumnIndex": 3,
                "criterionColumnIndex": 4,
                "valueColumnIndex": 2
            }"#,
        )
        .unwrap();
        let rows = read_csv_scores(path, &cfs).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].project, "1");
        assert_eq!(rows[0].criterion, "1");
        assert_eq!(rows[0].value, 4.0);
    }

    #[test]
    fn a_non_numeric_score_is_an_error() {
        let path = write_temp(
            "prosel_io_csv_bad.csv",
            "project,criterion,value\n1,1,good\n",
        );
        let cfs: FileSource = serde_json::from_str(
            r#"{ "provider": "csv", "filePath": "x", "field": "technical" }"#,
        )
        .unwrap();
        let res = read_csv_scores(path, &cfs);
        assert!(matches!(res, Err(SelError::CsvBadValue { lineno: 2, .. })));
    }
}
