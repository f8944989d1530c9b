// Reader for score grids kept in Excel workbooks: the first column holds
// the project, the header row holds the criterion ids, each cell a score.

use log::debug;
use snafu::prelude::*;

use calamine::{open_workbook, Reader, Xlsx};

use crate::tabulate::{io_common::simplify_file_name, *};

pub fn read_excel_matrix(path: String, cfs: &FileSource) -> SelResult<Vec<ParsedScoreRow>> {
    let p = path.clone();
    let mut workbook: Xlsx<_> =
        open_workbook(p).context(OpeningExcelSnafu { path: path.clone() })?;
    let wrange = match &cfs.excel_worksheet_name {
        Some(name) => workbook.worksheet_range(name.as_str()),
        None => workbook.worksheet_range_at(0),
    }
    .context(EmptyExcelSnafu {})?
    .context(OpeningExcelSnafu { path: path.clone() })?;

    let simplified_file_name = simplify_file_name(path.as_str());

    let mut rows = wrange.rows();
    let header = rows.next().context(EmptyExcelSnafu {})?;
    debug!("read_excel_matrix: header: {:?}", header);
    // The first header cell labels the project column and is ignored.
    let mut criterion_labels: Vec<String> = Vec::new();
    for (j, cell) in header.iter().skip(1).enumerate() {
        let label = read_label(cell, 1, j + 2)?;
        criterion_labels.push(label);
    }

    let mut res: Vec<ParsedScoreRow> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = (idx + 2) as u64;
        debug!("read_excel_matrix: row: {:?}", row);
        let project_cell = match row.first() {
            Some(c) => c,
            None => continue,
        };
        if *project_cell == calamine::DataType::Empty {
            continue;
        }
        let project = read_label(project_cell, lineno as usize, 1)?;
        for (j, cell) in row.iter().skip(1).take(criterion_labels.len()).enumerate() {
            let value = match cell {
                calamine::DataType::Float(f) => *f,
                calamine::DataType::Int(i) => *i as f64,
                // An empty cell means the pair has not been scored yet.
                calamine::DataType::Empty => continue,
                calamine::DataType::String(s) if s.trim().is_empty() => continue,
                calamine::DataType::String(s) => match s.trim().parse::<f64>() {
                    Result::Ok(v) => v,
                    Result::Err(_) => {
                        return Err(SelError::ExcelWrongCellType {
                            lineno,
                            content: s.clone(),
                        });
                    }
                },
                _ => {
                    return Err(SelError::ExcelWrongCellType {
                        lineno,
                        content: format!("{:?}", cell),
                    });
                }
            };
            res.push(ParsedScoreRow {
                id: Some(format!("{}-{:08}", simplified_file_name, lineno)),
                project: project.clone(),
                criterion: criterion_labels[j].clone(),
                value,
            });
        }
    }
    Ok(res)
}

// Header and project cells may hold text or numbers depending on how the
// workbook was produced; both are folded to their text form.
fn read_label(cell: &calamine::DataType, lineno: usize, colno: usize) -> SelResult<String> {
    match cell {
        calamine::DataType::String(s) => Ok(s.trim().to_string()),
        calamine::DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        calamine::DataType::Int(i) => Ok(format!("{}", i)),
        _ => whatever!(
            "read_excel_matrix: could not understand cell {:?} at row {} column {}",
            cell,
            lineno,
            colno
        ),
    }
}
