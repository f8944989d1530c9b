use log::{debug, info, warn};

use group_ranking::*;
use snafu::{prelude::*, Snafu};

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;

pub use crate::tabulate::config_reader::*;

#[derive(Debug, Snafu)]
pub enum SelError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Empty or missing worksheet"))]
    EmptyExcel {},
    #[snafu(display("Line {lineno}: cell {content} is not usable"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a number"))]
    ParsingJsonNumber {},
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error opening the CSV file"))]
    CsvOpen { source: csv::Error },
    #[snafu(display("Error reading a CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("Line {lineno}: {content} is not a numeric score"))]
    CsvBadValue { lineno: usize, content: String },
    #[snafu(display("Error writing file {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SelResult<T> = Result<T, SelError>;

/// A raw score cell, as parsed by the readers.
/// This is before project resolution and range validation.
#[derive(PartialEq, Debug, Clone)]
pub struct ParsedScoreRow {
    pub id: Option<String>,
    /// The project reference as written in the file: a numeric id, or a
    /// project code when the source is configured with `projectsByCode`.
    pub project: String,
    /// The criterion id as written in the file.
    pub criterion: String,
    pub value: f64,
}

/// One evaluation field after configuration validation.
#[derive(PartialEq, Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub weight: u32,
    pub criteria: Vec<Criterion>,
}

/// Checks the evaluation fields of the configuration and lowers them to the
/// engine's types. All the rejections here are configuration mistakes that
/// no amount of scoring can repair.
pub fn validate_fields(config: &SelConfig) -> SelResult<Vec<FieldSpec>> {
    let mut seen_fields: HashSet<String> = HashSet::new();
    let mut res: Vec<FieldSpec> = Vec::new();
    for f in config.fields.iter() {
        if !seen_fields.insert(f.name.clone()) {
            whatever!("field {:?} is declared twice", f.name);
        }
        if f.weight == 0 {
            whatever!("field {:?} must have a positive weight", f.name);
        }
        if f.criteria.is_empty() {
            whatever!("field {:?} has no criteria: cannot rank, add criteria", f.name);
        }
        let mut seen_criteria: HashSet<u32> = HashSet::new();
        let mut criteria: Vec<Criterion> = Vec::new();
        for c in f.criteria.iter() {
            if !seen_criteria.insert(c.id) {
                whatever!("criterion {} is declared twice in field {:?}", c.id, f.name);
            }
            if !(c.weight > 0.0 && c.weight <= 1.0) {
                whatever!(
                    "criterion {:?} in field {:?} must have a weight in (0, 1], got {}",
                    c.name,
                    f.name,
                    c.weight
                );
            }
            let kind = match c.kind.as_str() {
                "benefit" => CriterionKind::Benefit,
                "cost" => CriterionKind::Cost,
                x => {
                    whatever!("unknown criterion type {:?} for criterion {:?}", x, c.name)
                }
            };
            criteria.push(Criterion {
                id: c.id,
                name: c.name.clone(),
                weight: c.weight,
                kind,
            });
        }
        res.push(FieldSpec {
            name: f.name.clone(),
            weight: f.weight,
            criteria,
        });
    }
    for s in config.score_file_sources.iter() {
        if !res.iter().any(|f| f.name == s.field) {
            whatever!(
                "score source {:?} references unknown field {:?}",
                s.file_path,
                s.field
            );
        }
    }
    Ok(res)
}

/// Lowers parsed score rows to engine entries for one field.
///
/// Rows that do not resolve to a declared project or criterion, or whose
/// value is not a whole number between 1 and 5, are skipped with a warning:
/// one stray line in an exported file should not abort the tabulation.
pub fn validate_scores(
    rows: &[ParsedScoreRow],
    field: &FieldSpec,
    projects: &[SelProject],
    by_code: bool,
) -> Vec<ScoreEntry> {
    let mut res: Vec<ScoreEntry> = Vec::new();
    let mut skipped: u32 = 0;
    for row in rows.iter() {
        let project_id = if by_code {
            projects
                .iter()
                .find(|p| p.code.as_deref() == Some(row.project.as_str()))
                .map(|p| p.id)
        } else {
            row.project
                .parse::<u32>()
                .ok()
                .filter(|id| projects.iter().any(|p| p.id == *id))
        };
        let project_id = match project_id {
            Some(id) => id,
            None => {
                warn!(
                    "validate_scores: row {:?}: unknown project {:?}, skipping",
                    row.id, row.project
                );
                skipped += 1;
                continue;
            }
        };
        let criterion_id = match row.criterion.parse::<u32>() {
            Result::Ok(id) if field.criteria.iter().any(|c| c.id == id) => id,
            _ => {
                warn!(
                    "validate_scores: row {:?}: criterion {:?} is not part of field {:?}, skipping",
                    row.id, row.criterion, field.name
                );
                skipped += 1;
                continue;
            }
        };
        // The evaluation forms only offer whole scores from 1 to 5.
        if row.value.fract() != 0.0 || !(1.0..=5.0).contains(&row.value) {
            warn!(
                "validate_scores: row {:?}: score {} is out of the 1-5 range, skipping",
                row.id, row.value
            );
            skipped += 1;
            continue;
        }
        res.push(ScoreEntry {
            project_id,
            criterion_id,
            value: row.value,
        });
    }
    if skipped > 0 {
        warn!(
            "validate_scores: field {:?}: {} rows skipped out of {}",
            field.name,
            skipped,
            rows.len()
        );
    }
    res
}

fn field_ranking_to_json(spec: &FieldSpec, ranking: &FieldRanking, projects: &[SelProject]) -> JSValue {
    let results: Vec<JSValue> = ranking
        .results
        .iter()
        .map(|r| {
            json!({
                "projectId": r.project_id,
                "project": project_name(projects, r.project_id),
                "dPositive": format!("{:.4}", r.d_positive),
                "dNegative": format!("{:.4}", r.d_negative),
                "score": format!("{:.4}", r.score),
                "rank": r.rank,
            })
        })
        .collect();
    json!({
        "field": spec.name,
        "weight": spec.weight,
        "excludedProjects": ranking.excluded_projects,
        "results": results,
    })
}

fn project_name(projects: &[SelProject], project_id: u32) -> String {
    projects
        .iter()
        .find(|p| p.id == project_id)
        .map(|p| p.name.clone())
        .unwrap_or_default()
}

fn build_summary_js(
    config: &SelConfig,
    field_rankings: &[JSValue],
    consensus: &[BordaResult],
    total_weight: u32,
) -> JSValue {
    let c = OutputConfig {
        selection: config.output_settings.selection_name.clone(),
        date: config.output_settings.selection_date.clone(),
        organization: config.output_settings.organization.clone(),
        total_field_weight: total_weight,
        total_projects: config.projects.len() as u32,
    };
    // The best reachable total: first place in every field.
    let max_score = (config.projects.len() as u64 * total_weight as u64) as f64;
    let consensus_js: Vec<JSValue> = consensus
        .iter()
        .map(|r| {
            let share = if max_score == 0.0 {
                0.0
            } else {
                r.final_score / max_score
            };
            json!({
                "projectId": r.project_id,
                "project": project_name(&config.projects, r.project_id),
                "finalScore": format!("{:.0}", r.final_score),
                "share": format!("{:.4}", share),
                "finalRank": r.final_rank,
            })
        })
        .collect();
    json!({
        "config": c,
        "fieldRankings": field_rankings,
        "consensus": consensus_js,
    })
}

/// Runs the two ranking stages over materialized inputs and assembles the
/// JSON summary. Separated from the file handling so that it can be
/// exercised directly in tests.
pub fn tabulate(
    config: &SelConfig,
    entries_by_field: &BTreeMap<String, Vec<ScoreEntry>>,
) -> SelResult<JSValue> {
    let fields = validate_fields(config)?;
    let projects: Vec<Project> = config
        .projects
        .iter()
        .map(|p| Project {
            id: p.id,
            code: p.code.clone(),
            name: p.name.clone(),
        })
        .collect();

    let no_entries: Vec<ScoreEntry> = Vec::new();
    let mut field_results: BTreeMap<String, Vec<TopsisResult>> = BTreeMap::new();
    let mut field_rankings: Vec<JSValue> = Vec::new();
    for spec in fields.iter() {
        let entries = entries_by_field.get(&spec.name).unwrap_or(&no_entries);
        match compute_field_ranking(&spec.criteria, &projects, entries) {
            Result::Ok(ranking) => {
                field_rankings.push(field_ranking_to_json(spec, &ranking, &config.projects));
                field_results.insert(spec.name.clone(), ranking.results);
            }
            Result::Err(RankingErrors::EmptyMatrix) => {
                // Normal while the evaluation round is still in progress:
                // the field votes with an empty ranking.
                info!(
                    "tabulate: field {:?} has no evaluated projects yet",
                    spec.name
                );
                let empty = FieldRanking {
                    results: Vec::new(),
                    excluded_projects: projects.len() as u32,
                };
                field_rankings.push(field_ranking_to_json(spec, &empty, &config.projects));
                field_results.insert(spec.name.clone(), Vec::new());
            }
            Result::Err(e) => {
                whatever!("field {:?} cannot be ranked: {}", spec.name, e)
            }
        }
    }

    let weights: BTreeMap<String, u32> = fields.iter().map(|f| (f.name.clone(), f.weight)).collect();
    let consensus = match compute_consensus(&field_results, &weights, projects.len()) {
        Result::Ok(c) => c,
        Result::Err(RankingErrors::NoFieldResults) => {
            whatever!("no field produced a ranking; record scores for at least one field first")
        }
        Result::Err(e) => {
            whatever!("consensus failed: {}", e)
        }
    };

    let total_weight: u32 = fields.iter().map(|f| f.weight).sum();
    Ok(build_summary_js(
        config,
        &field_rankings,
        &consensus,
        total_weight,
    ))
}

fn read_score_file(root_path: &Path, source: &FileSource) -> SelResult<Vec<ParsedScoreRow>> {
    let p: PathBuf = root_path.join(source.file_path.clone());
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read score file {:?}", p2);
    match source.provider.as_str() {
        "csv" => io_csv::read_csv_scores(p2, source),
        "xlsx_matrix" => io_xlsx::read_excel_matrix(p2, source),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

pub fn run_selection(
    config_path: String,
    out_path: Option<String>,
    check_summary_path: Option<String>,
) -> SelResult<()> {
    let config_p = Path::new(config_path.as_str());
    let config_str = fs::read_to_string(config_path.clone()).context(OpeningJsonSnafu {
        path: config_path.clone(),
    })?;
    let config: SelConfig = serde_json::from_str(&config_str).context(ParsingJsonSnafu {})?;
    info!("config: {:?}", config);

    let fields = validate_fields(&config)?;
    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;

    let mut entries_by_field: BTreeMap<String, Vec<ScoreEntry>> = BTreeMap::new();
    for source in config.score_file_sources.iter() {
        let rows = read_score_file(root_p, source)?;
        debug!(
            "run_selection: source {:?}: {} rows",
            source.file_path,
            rows.len()
        );
        let spec = match fields.iter().find(|f| f.name == source.field) {
            Some(s) => s,
            None => whatever!("score source references unknown field {:?}", source.field),
        };
        let entries = validate_scores(
            &rows,
            spec,
            &config.projects,
            source.projects_by_code.unwrap_or(false),
        );
        entries_by_field
            .entry(source.field.clone())
            .or_default()
            .extend(entries);
    }

    let summary = tabulate(&config, &entries_by_field)?;
    let pretty = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    println!("{}", pretty);

    match out_path {
        Some(p) if p == "stdout" => {
            // Already on stdout.
        }
        Some(p) => {
            fs::write(p.clone(), pretty.as_bytes()).context(WritingSummarySnafu { path: p })?;
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_ref != pretty {
            warn!("Found differences with the reference summary");
            print_diff(pretty_ref.as_str(), pretty.as_ref(), "\n");
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> SelConfig {
        let raw = r#"
        {
            "outputSettings": {
                "selectionName": "2024 infrastructure portfolio",
                "selectionDate": "2024-06-01",
                "organization": "regional development board"
            },
            "projects": [
                { "id": 1, "code": "PRJ-001", "name": "harbor upgrade", "location": "north district" },
                { "id": 2, "code": "PRJ-002", "name": "rail link" },
                { "id": 3, "code": "PRJ-003", "name": "water treatment", "status": "proposed" }
            ],
            "fields": [
                {
                    "name": "supervisory",
                    "weight": 7,
                    "criteria": [
                        { "id": 10, "name": "strategic alignment", "weight": 1.0, "type": "benefit" }
                    ]
                },
                {
                    "name": "technical",
                    "weight": 4,
                    "criteria": [
                        { "id": 1, "name": "design maturity", "weight": 0.5, "type": "benefit" },
                        { "id": 2, "name": "execution risk", "weight": 0.5, "type": "cost" }
                    ]
                },
                {
                    "name": "financial",
                    "weight": 2,
                    "criteria": [
                        { "id": 20, "name": "cost overrun exposure", "weight": 0.8, "type": "cost" }
                    ]
                }
            ],
            "scoreFileSources": []
        }
        "#;
        serde_json::from_str(raw).unwrap()
    }

    fn entry(project_id: u32, criterion_id: u32, value: f64) -> ScoreEntry {
        ScoreEntry {
            project_id,
            criterion_id,
            value,
        }
    }

    #[test]
    fn full_round_summary() {
        let config = sample_config();
        let entries_by_field: BTreeMap<String, Vec<ScoreEntry>> = [
            (
                "supervisory".to_string(),
                vec![entry(1, 10, 2.0), entry(2, 10, 5.0), entry(3, 10, 4.0)],
            ),
            (
                "technical".to_string(),
                vec![
                    entry(1, 1, 5.0),
                    entry(1, 2, 1.0),
                    entry(2, 1, 3.0),
                    entry(2, 2, 3.0),
                    entry(3, 1, 1.0),
                    entry(3, 2, 5.0),
                ],
            ),
            // The financial evaluation has not started yet.
        ]
        .into_iter()
        .collect();

        let summary = tabulate(&config, &entries_by_field).unwrap();

        assert_eq!(summary["config"]["totalFieldWeight"], 13);
        assert_eq!(summary["config"]["totalProjects"], 3);

        let technical = &summary["fieldRankings"][1];
        assert_eq!(technical["field"], "technical");
        assert_eq!(technical["excludedProjects"], 0);
        assert_eq!(technical["results"][0]["projectId"], 1);
        assert_eq!(technical["results"][0]["score"], "1.0000");
        assert_eq!(technical["results"][1]["score"], "0.5000");
        assert_eq!(technical["results"][2]["score"], "0.0000");

        let financial = &summary["fieldRankings"][2];
        assert_eq!(financial["excludedProjects"], 3);
        assert_eq!(financial["results"].as_array().unwrap().len(), 0);

        // Supervisory: p2 > p3 > p1 (weight 7); technical: p1 > p2 > p3
        // (weight 4); financial: empty. With 3 projects in the universe:
        // p2 = 3*7 + 2*4 = 29, p1 = 1*7 + 3*4 = 19, p3 = 2*7 + 1*4 = 18.
        let consensus = summary["consensus"].as_array().unwrap();
        assert_eq!(consensus[0]["projectId"], 2);
        assert_eq!(consensus[0]["finalScore"], "29");
        assert_eq!(consensus[0]["share"], "0.7436");
        assert_eq!(consensus[0]["finalRank"], 1);
        assert_eq!(consensus[1]["projectId"], 1);
        assert_eq!(consensus[1]["finalScore"], "19");
        assert_eq!(consensus[2]["projectId"], 3);
        assert_eq!(consensus[2]["finalScore"], "18");
    }

    #[test]
    fn tabulation_is_reproducible() {
        let config = sample_config();
        let entries_by_field: BTreeMap<String, Vec<ScoreEntry>> = [(
            "technical".to_string(),
            vec![
                entry(1, 1, 4.0),
                entry(1, 2, 2.0),
                entry(2, 1, 4.0),
                entry(2, 2, 2.0),
                entry(3, 1, 3.0),
                entry(3, 2, 3.0),
            ],
        )]
        .into_iter()
        .collect();
        let first = tabulate(&config, &entries_by_field).unwrap();
        let second = tabulate(&config, &entries_by_field).unwrap();
        assert_eq!(first, second);
        // Projects 1 and 2 are scored identically: the tie goes to the
        // lower id.
        assert_eq!(first["fieldRankings"][1]["results"][0]["projectId"], 1);
        assert_eq!(first["fieldRankings"][1]["results"][1]["projectId"], 2);
    }

    #[test]
    fn no_scores_anywhere_is_an_error() {
        let config = sample_config();
        let res = tabulate(&config, &BTreeMap::new());
        assert!(res.is_err());
    }

    #[test]
    fn unknown_criterion_type_is_rejected() {
        let mut config = sample_config();
        config.fields[0].criteria[0].kind = "target".to_string();
        assert!(validate_fields(&config).is_err());
    }

    #[test]
    fn zero_field_weight_is_rejected() {
        let mut config = sample_config();
        config.fields[1].weight = 0;
        assert!(validate_fields(&config).is_err());
    }

    #[test]
    fn criterion_weight_above_one_is_rejected() {
        let mut config = sample_config();
        config.fields[1].criteria[0].weight = 1.5;
        assert!(validate_fields(&config).is_err());
    }

    #[test]
    fn field_without_criteria_is_rejected() {
        let mut config = sample_config();
        config.fields[2].criteria.clear();
        assert!(validate_fields(&config).is_err());
    }

    #[test]
    fn source_referencing_unknown_field_is_rejected() {
        let mut config = sample_config();
        let source: FileSource = serde_json::from_str(
            r#"{ "provider": "csv", "filePath": "scores.csv", "field": "legal" }"#,
        )
        .unwrap();
        config.score_file_sources.push(source);
        assert!(validate_fields(&config).is_err());
    }

    #[test]
    fn score_rows_are_filtered_and_resolved() {
        let config = sample_config();
        let fields = validate_fields(&config).unwrap();
        let technical = fields.iter().find(|f| f.name == "technical").unwrap();
        let rows = vec![
            ParsedScoreRow {
                id: Some("r1".to_string()),
                project: "1".to_string(),
                criterion: "1".to_string(),
                value: 4.0,
            },
            // Unknown project id.
            ParsedScoreRow {
                id: Some("r2".to_string()),
                project: "99".to_string(),
                criterion: "1".to_string(),
                value: 4.0,
            },
            // Criterion from another field.
            ParsedScoreRow {
                id: Some("r3".to_string()),
                project: "1".to_string(),
                criterion: "10".to_string(),
                value: 4.0,
            },
            // Out of range and fractional values.
            ParsedScoreRow {
                id: Some("r4".to_string()),
                project: "2".to_string(),
                criterion: "2".to_string(),
                value: 6.0,
            },
            ParsedScoreRow {
                id: Some("r5".to_string()),
                project: "2".to_string(),
                criterion: "2".to_string(),
                value: 3.5,
            },
            ParsedScoreRow {
                id: Some("r6".to_string()),
                project: "2".to_string(),
                criterion: "2".to_string(),
                value: 3.0,
            },
        ];
        let entries = validate_scores(&rows, technical, &config.projects, false);
        assert_eq!(
            entries,
            vec![entry(1, 1, 4.0), entry(2, 2, 3.0)]
        );
    }

    #[test]
    fn score_rows_resolve_projects_by_code() {
        let config = sample_config();
        let fields = validate_fields(&config).unwrap();
        let technical = fields.iter().find(|f| f.name == "technical").unwrap();
        let rows = vec![ParsedScoreRow {
            id: None,
            project: "PRJ-002".to_string(),
            criterion: "1".to_string(),
            value: 5.0,
        }];
        let entries = validate_scores(&rows, technical, &config.projects, true);
        assert_eq!(entries, vec![entry(2, 1, 5.0)]);
    }
}
