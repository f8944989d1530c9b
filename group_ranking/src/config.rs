// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The optimization direction of a criterion.
///
/// A benefit criterion rewards higher raw scores, a cost criterion rewards
/// lower ones. The direction decides which end of a weighted column becomes
/// the positive ideal during a ranking run.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CriterionKind {
    Benefit,
    Cost,
}

/// A weighted evaluation criterion within one field.
///
/// Weights are used exactly as supplied and do not need to sum to 1 across
/// a field: the weighting step scales the normalized columns by the raw
/// values.
#[derive(PartialEq, Debug, Clone)]
pub struct Criterion {
    pub id: u32,
    pub name: String,
    pub weight: f64,
    pub kind: CriterionKind,
}

/// A candidate project. Read-only reference data for the engine.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Project {
    pub id: u32,
    pub code: Option<String>,
    pub name: String,
}

/// One recorded score for a (project, criterion) pair.
///
/// Entries are applied in order: when the same pair appears more than once,
/// the later value supersedes the earlier one. The entries handed to the
/// engine are expected to be already filtered to one evaluation field and
/// its evaluating user.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoreEntry {
    pub project_id: u32,
    pub criterion_id: u32,
    pub value: f64,
}

// ******** Output data structures *********

/// Standing of a single project within one field.
#[derive(PartialEq, Debug, Clone)]
pub struct TopsisResult {
    pub project_id: u32,
    /// Distance to the positive ideal solution.
    pub d_positive: f64,
    /// Distance to the negative ideal solution.
    pub d_negative: f64,
    /// Relative closeness to the positive ideal, in [0, 1].
    pub score: f64,
    /// 1-based position in the field, best first.
    pub rank: u32,
}

/// The ranking of one field.
///
/// `excluded_projects` counts the projects that could not be ranked because
/// their score row was missing or incomplete.
#[derive(PartialEq, Debug, Clone)]
pub struct FieldRanking {
    pub results: Vec<TopsisResult>,
    pub excluded_projects: u32,
}

/// Consensus standing of a single project across all fields.
#[derive(PartialEq, Debug, Clone)]
pub struct BordaResult {
    pub project_id: u32,
    pub final_score: f64,
    pub final_rank: u32,
}

/// Errors that prevent a ranking from being computed.
///
/// Degenerate numeric situations (an all-zero criterion column, a project
/// at zero distance from both ideals) are not errors: they are resolved
/// with deterministic fallback values so that one odd criterion never
/// aborts a whole run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RankingErrors {
    /// The field has no criteria defined. Not recoverable until the
    /// configuration changes.
    InsufficientCriteria,
    /// No project has a complete score row for the field. Expected in
    /// partial-progress states; callers usually report it as "no results
    /// yet" rather than as a failure.
    EmptyMatrix,
    /// Every field handed to the consensus step had an empty ranking.
    NoFieldResults,
}

impl Error for RankingErrors {}

impl Display for RankingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankingErrors::InsufficientCriteria => {
                write!(f, "no criteria are defined for this field")
            }
            RankingErrors::EmptyMatrix => {
                write!(f, "no project has a complete score row for this field")
            }
            RankingErrors::NoFieldResults => {
                write!(f, "no field produced a ranking to aggregate")
            }
        }
    }
}
