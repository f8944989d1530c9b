pub use crate::config::*;
use crate::compute_field_ranking;

/// A builder for collecting the scores of one evaluation field.
///
/// It applies the upsert rule as scores arrive: re-recording a
/// (project, criterion) pair replaces the previous value.
///
/// ```
/// pub use group_ranking::builder::Builder;
/// pub use group_ranking::{Criterion, CriterionKind, Project};
/// # use group_ranking::RankingErrors;
///
/// let mut builder = Builder::new()
///     .criteria(&[
///         Criterion { id: 1, name: "viability".to_string(), weight: 0.6, kind: CriterionKind::Benefit },
///         Criterion { id: 2, name: "execution risk".to_string(), weight: 0.4, kind: CriterionKind::Cost },
///     ])?
///     .projects(&[
///         Project { id: 10, code: None, name: "harbor upgrade".to_string() },
///         Project { id: 11, code: None, name: "rail link".to_string() },
///     ])?;
///
/// builder.add_score(10, 1, 4.0);
/// builder.add_score(10, 2, 2.0);
/// builder.add_score(11, 1, 3.0);
/// builder.add_score(11, 2, 5.0);
///
/// let ranking = builder.ranking()?;
/// assert_eq!(ranking.results[0].project_id, 10);
/// # Ok::<(), RankingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _criteria: Vec<Criterion>,
    pub(crate) _projects: Vec<Project>,
    pub(crate) _entries: Vec<ScoreEntry>,
}

impl Default for Builder {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            _criteria: Vec::new(),
            _projects: Vec::new(),
            _entries: Vec::new(),
        }
    }

    pub fn criteria(self, criteria: &[Criterion]) -> Result<Builder, RankingErrors> {
        if criteria.is_empty() {
            return Err(RankingErrors::InsufficientCriteria);
        }
        Ok(Builder {
            _criteria: criteria.to_vec(),
            _projects: self._projects,
            _entries: self._entries,
        })
    }

    pub fn projects(self, projects: &[Project]) -> Result<Builder, RankingErrors> {
        Ok(Builder {
            _criteria: self._criteria,
            _projects: projects.to_vec(),
            _entries: self._entries,
        })
    }

    /// Records one score. The latest value for a pair wins.
    pub fn add_score(&mut self, project_id: u32, criterion_id: u32, value: f64) {
        let existing = self
            ._entries
            .iter_mut()
            .find(|e| e.project_id == project_id && e.criterion_id == criterion_id);
        match existing {
            Some(e) => e.value = value,
            None => self._entries.push(ScoreEntry {
                project_id,
                criterion_id,
                value,
            }),
        }
    }

    /// Runs the ranking over the collected state.
    pub fn ranking(&self) -> Result<FieldRanking, RankingErrors> {
        compute_field_ranking(&self._criteria, &self._projects, &self._entries)
    }
}
