/*!

# Quick start

This example walks through one selection round end to end, entirely in
memory. A committee of three decision makers must pick among three
infrastructure projects. Each decision maker owns one evaluation field
(supervisory, technical, financial) and scores every project from 1 to 5
against the weighted criteria of that field.

**Scoring a field** Collect the scores of one field with the [crate::builder::Builder]:

```
use group_ranking::builder::Builder;
use group_ranking::{Criterion, CriterionKind, Project};
# use group_ranking::RankingErrors;

let projects = vec![
    Project { id: 1, code: Some("PRJ-001".to_string()), name: "harbor upgrade".to_string() },
    Project { id: 2, code: Some("PRJ-002".to_string()), name: "rail link".to_string() },
    Project { id: 3, code: Some("PRJ-003".to_string()), name: "water treatment".to_string() },
];

let mut technical = Builder::new()
    .criteria(&[
        Criterion { id: 1, name: "design maturity".to_string(), weight: 0.5, kind: CriterionKind::Benefit },
        Criterion { id: 2, name: "execution risk".to_string(), weight: 0.5, kind: CriterionKind::Cost },
    ])?
    .projects(&projects)?;

technical.add_score(1, 1, 5.0);
technical.add_score(1, 2, 2.0);
technical.add_score(2, 1, 3.0);
technical.add_score(2, 2, 4.0);
technical.add_score(3, 1, 4.0);
technical.add_score(3, 2, 1.0);

let ranking = technical.ranking()?;
assert_eq!(ranking.results.len(), 3);
assert_eq!(ranking.excluded_projects, 0);
# Ok::<(), RankingErrors>(())
```

Projects that were not scored against every criterion of the field are not
ranked. They are counted in [crate::FieldRanking::excluded_projects] so the
caller can report how far the evaluation has progressed.

**Fusing the fields** Once the fields that have been evaluated produced
their rankings, fuse them into the consensus with
[crate::compute_consensus]. Fields that have not been evaluated yet can be
passed with an empty list; the consensus is then partial but valid:

```
use std::collections::BTreeMap;
use group_ranking::{compute_consensus, TopsisResult};
# use group_ranking::RankingErrors;

# let sup_results: Vec<TopsisResult> = vec![TopsisResult { project_id: 1, d_positive: 0.0, d_negative: 0.2, score: 1.0, rank: 1 }];
# let tech_results: Vec<TopsisResult> = vec![TopsisResult { project_id: 1, d_positive: 0.0, d_negative: 0.2, score: 1.0, rank: 1 }];
let field_results: BTreeMap<String, Vec<TopsisResult>> = [
    ("supervisory".to_string(), sup_results),
    ("technical".to_string(), tech_results),
    ("financial".to_string(), vec![]),
]
.into_iter()
.collect();

let field_weights: BTreeMap<String, u32> = [
    ("supervisory".to_string(), 7),
    ("technical".to_string(), 4),
    ("financial".to_string(), 2),
]
.into_iter()
.collect();

let consensus = compute_consensus(&field_results, &field_weights, 3)?;
assert_eq!(consensus[0].final_rank, 1);
# Ok::<(), RankingErrors>(())
```

A project ranked first in a field earns as many points there as there are
projects under consideration, weighted by the field's institutional weight;
a project absent from a field earns zero from it but keeps the points of the
other fields. Equal totals are resolved by ascending project id, so the
consensus is reproducible run after run.

If your scores live in files rather than in memory, the `prosel` command
line program drives this crate from a JSON configuration. See the
[manual](crate::manual).

*/
