mod config;
pub mod builder;
pub mod manual;
pub mod quick_start;

use log::{debug, info, warn};

use std::cmp::Ordering;
use std::collections::BTreeMap;

pub use crate::config::*;

// **** Private structures ****

/// A dense score row for one project, in the criteria order of the field.
#[derive(PartialEq, Debug, Clone)]
struct DecisionRow {
    project_id: u32,
    values: Vec<f64>,
}

// Invariant: rows only contain complete score vectors and are sorted by
// ascending project id. The matrix is rebuilt from scratch on every run and
// never persisted.
#[derive(PartialEq, Debug, Clone)]
struct DecisionMatrix {
    rows: Vec<DecisionRow>,
    excluded_projects: u32,
}

/// Ranks the projects of one evaluation field with the TOPSIS method.
///
/// Arguments:
/// * `criteria` the weighted criteria of the field
/// * `projects` the candidate projects under consideration
/// * `entries` the raw scores recorded for the field, already filtered to
/// the evaluating user. Later entries supersede earlier ones for the same
/// (project, criterion) pair.
///
/// Only projects with a score for every criterion of the field are ranked.
/// The others are left out of the results and reported through
/// [FieldRanking::excluded_projects]: padding a missing score with zero
/// would leak into the column normalization and skew every other score.
pub fn compute_field_ranking(
    criteria: &[Criterion],
    projects: &[Project],
    entries: &[ScoreEntry],
) -> Result<FieldRanking, RankingErrors> {
    info!(
        "compute_field_ranking: {:?} projects, {:?} criteria, {:?} score entries",
        projects.len(),
        criteria.len(),
        entries.len()
    );
    let matrix = build_decision_matrix(criteria, projects, entries)?;
    if matrix.rows.is_empty() {
        debug!("compute_field_ranking: no complete row, nothing to rank");
        return Err(RankingErrors::EmptyMatrix);
    }
    debug!(
        "compute_field_ranking: {:?} complete rows, {:?} excluded",
        matrix.rows.len(),
        matrix.excluded_projects
    );
    let results = rank_rows(&matrix, criteria);
    for r in results.iter() {
        info!(
            "compute_field_ranking: rank {}: project {} score {:.4}",
            r.rank, r.project_id, r.score
        );
    }
    Ok(FieldRanking {
        results,
        excluded_projects: matrix.excluded_projects,
    })
}

/// Fuses independent per-field rankings into one consensus ranking with a
/// weighted Borda count.
///
/// Arguments:
/// * `field_results` the ranking of each voting field. Fields that have not
/// been tabulated yet may be present with an empty list: partial consensus
/// is a legitimate state and only fails when every field is empty.
/// * `field_weights` the institutional weight of each field's vote.
/// * `total_projects` the size of the full project universe, not only of
/// the ranked projects. A project ranked first in a field earns
/// `total_projects` points there; a project absent from a field earns an
/// explicit zero but stays eligible for the other fields' points.
pub fn compute_consensus(
    field_results: &BTreeMap<String, Vec<TopsisResult>>,
    field_weights: &BTreeMap<String, u32>,
    total_projects: usize,
) -> Result<Vec<BordaResult>, RankingErrors> {
    if field_results.values().all(|results| results.is_empty()) {
        return Err(RankingErrors::NoFieldResults);
    }

    let mut totals: BTreeMap<u32, u64> = BTreeMap::new();
    for (field, results) in field_results.iter() {
        let weight: u64 = match field_weights.get(field) {
            Some(w) => *w as u64,
            None => {
                warn!(
                    "compute_consensus: no weight defined for field {:?}, counting it as zero",
                    field
                );
                0
            }
        };
        for r in results.iter() {
            // Borda points: first place earns total_projects points, last
            // place earns one. A rank beyond the universe earns nothing.
            let points = (total_projects as u64 + 1).saturating_sub(r.rank as u64);
            let contribution = points * weight;
            debug!(
                "compute_consensus: project {} field {:?}: rank {} -> {} points, contribution {}",
                r.project_id, field, r.rank, points, contribution
            );
            let e = totals.entry(r.project_id).or_insert(0);
            *e += contribution;
        }
    }

    let mut consensus: Vec<BordaResult> = totals
        .iter()
        .map(|(project_id, points)| BordaResult {
            project_id: *project_id,
            final_score: *points as f64,
            final_rank: 0,
        })
        .collect();
    // Final score descending, ascending project id on equal totals.
    consensus.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
    for (idx, r) in consensus.iter_mut().enumerate() {
        r.final_rank = (idx + 1) as u32;
    }

    for r in consensus.iter() {
        info!(
            "compute_consensus: rank {}: project {} final score {}",
            r.final_rank, r.project_id, r.final_score
        );
    }
    Ok(consensus)
}

/// Assembles the dense decision matrix of one field from sparse score
/// entries. Pure transform: nothing is read or written outside the inputs.
fn build_decision_matrix(
    criteria: &[Criterion],
    projects: &[Project],
    entries: &[ScoreEntry],
) -> Result<DecisionMatrix, RankingErrors> {
    if criteria.is_empty() {
        return Err(RankingErrors::InsufficientCriteria);
    }

    // Upsert semantics: the latest entry for a pair wins.
    let mut latest: BTreeMap<(u32, u32), f64> = BTreeMap::new();
    for e in entries.iter() {
        latest.insert((e.project_id, e.criterion_id), e.value);
    }

    let mut project_ids: Vec<u32> = projects.iter().map(|p| p.id).collect();
    project_ids.sort_unstable();
    project_ids.dedup();

    let mut rows: Vec<DecisionRow> = Vec::new();
    let mut excluded: u32 = 0;
    for project_id in project_ids {
        let values: Vec<f64> = criteria
            .iter()
            .filter_map(|c| latest.get(&(project_id, c.id)).copied())
            .collect();
        if values.len() == criteria.len() {
            rows.push(DecisionRow { project_id, values });
        } else {
            // Unscored and partially scored projects both fall under the
            // complete-row rule.
            debug!(
                "build_decision_matrix: project {} has {}/{} scores, excluding",
                project_id,
                values.len(),
                criteria.len()
            );
            excluded += 1;
        }
    }
    Ok(DecisionMatrix {
        rows,
        excluded_projects: excluded,
    })
}

/// Column-wise Euclidean normalization of the raw matrix. An all-zero
/// column normalizes to zeros instead of dividing by its zero norm.
fn normalize_rows(matrix: &DecisionMatrix, num_criteria: usize) -> Vec<Vec<f64>> {
    let mut norms: Vec<f64> = vec![0.0; num_criteria];
    for row in matrix.rows.iter() {
        for (j, v) in row.values.iter().enumerate() {
            norms[j] += v * v;
        }
    }
    for n in norms.iter_mut() {
        *n = n.sqrt();
    }
    debug!("normalize_rows: column norms: {:?}", norms);

    matrix
        .rows
        .iter()
        .map(|row| {
            row.values
                .iter()
                .enumerate()
                .map(|(j, v)| if norms[j] == 0.0 { 0.0 } else { v / norms[j] })
                .collect()
        })
        .collect()
}

/// Runs the TOPSIS steps over a non-empty matrix: normalize, weight,
/// compute the ideal solutions, measure distances and rank by relative
/// closeness.
fn rank_rows(matrix: &DecisionMatrix, criteria: &[Criterion]) -> Vec<TopsisResult> {
    let m = criteria.len();

    let weighted: Vec<Vec<f64>> = normalize_rows(matrix, m)
        .iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .map(|(j, r)| criteria[j].weight * r)
                .collect()
        })
        .collect();

    // Ideal solutions per criterion. The positive ideal takes the best end
    // of each weighted column, where "best" depends on the direction.
    let mut ideal_pos: Vec<f64> = vec![0.0; m];
    let mut ideal_neg: Vec<f64> = vec![0.0; m];
    for j in 0..m {
        let lo = weighted
            .iter()
            .map(|row| row[j])
            .fold(f64::INFINITY, f64::min);
        let hi = weighted
            .iter()
            .map(|row| row[j])
            .fold(f64::NEG_INFINITY, f64::max);
        match criteria[j].kind {
            CriterionKind::Benefit => {
                ideal_pos[j] = hi;
                ideal_neg[j] = lo;
            }
            CriterionKind::Cost => {
                ideal_pos[j] = lo;
                ideal_neg[j] = hi;
            }
        }
    }
    debug!(
        "rank_rows: ideal positive: {:?} ideal negative: {:?}",
        ideal_pos, ideal_neg
    );

    let mut results: Vec<TopsisResult> = Vec::with_capacity(matrix.rows.len());
    for (i, row) in matrix.rows.iter().enumerate() {
        let mut sum_pos = 0.0;
        let mut sum_neg = 0.0;
        for j in 0..m {
            let v = weighted[i][j];
            sum_pos += (v - ideal_pos[j]) * (v - ideal_pos[j]);
            sum_neg += (v - ideal_neg[j]) * (v - ideal_neg[j]);
        }
        let d_positive = sum_pos.sqrt();
        let d_negative = sum_neg.sqrt();
        // When all rows are identical both distances collapse to zero.
        // The score is pinned to zero so that no NaN reaches the sort.
        let score = if d_positive + d_negative == 0.0 {
            0.0
        } else {
            d_negative / (d_positive + d_negative)
        };
        results.push(TopsisResult {
            project_id: row.project_id,
            d_positive,
            d_negative,
            score,
            rank: 0,
        });
    }

    // Closeness descending; ties resolved by ascending project id so that
    // repeated runs produce identical output.
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.project_id.cmp(&b.project_id))
    });
    for (idx, r) in results.iter_mut().enumerate() {
        r.rank = (idx + 1) as u32;
    }
    results
}
