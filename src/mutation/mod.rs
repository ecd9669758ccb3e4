//! Validate-then-apply writes for reviews and critiques.
//!
//! Each write parses its body, validates it against a graph taken while the
//! review's lock is held, and only then touches the store. The first
//! violated rule is the one reported.

mod critique;
mod input;
mod locks;
mod review;

pub use critique::{CritiquePatch, CritiqueResponses, RespondOutcome};
pub use input::sanitize_comment;
pub use locks::KeyedLocks;
pub use review::ReviewPatch;

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::relations::Graph;
use crate::temporal::resolve_period_state;
use crate::types::{CriteriaKey, Timestamp};
use input::Entry;

/// Response to a review or critique PATCH. Empty unless the write submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatchOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_time: Option<Timestamp>,
}

fn require_open(now: Timestamp, open_at: Timestamp, close_at: Timestamp, period: &str) -> Result<()> {
    if resolve_period_state(now, open_at, close_at, 0).is_open() {
        Ok(())
    } else {
        Err(Error::forbidden(format!("{period} period is not open")))
    }
}

/// Every entry must name a criteria of the assignment, and no criteria may
/// appear twice. Unknown criteria are reported before duplicates.
fn check_rubric(graph: &Graph, assignment_id: &str, field: &str, entries: &[Entry]) -> Result<()> {
    for entry in entries {
        let key = CriteriaKey {
            assignment_id: assignment_id.to_string(),
            category_id: entry.category_id.clone(),
            criteria_id: entry.criteria_id.clone(),
        };
        if graph.criteria(&key).is_none() {
            return Err(Error::validation(
                field,
                format!(
                    "unknown criteria {}/{}",
                    entry.category_id, entry.criteria_id
                ),
            ));
        }
    }

    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert((entry.category_id.as_str(), entry.criteria_id.as_str())) {
            return Err(Error::validation(
                field,
                format!(
                    "duplicate criteria {}/{}",
                    entry.category_id, entry.criteria_id
                ),
            ));
        }
    }

    Ok(())
}

/// Submitting requires an entry for every expected criteria.
fn check_covers<'e, I>(field: &str, expected: I, entries: &[Entry]) -> Result<()>
where
    I: IntoIterator<Item = &'e str>,
{
    let present: HashSet<&str> = entries.iter().map(|e| e.criteria_id.as_str()).collect();
    let missing: Vec<&str> = expected
        .into_iter()
        .filter(|criteria_id| !present.contains(criteria_id))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::validation(
            field,
            format!("missing criteria: {}", missing.join(", ")),
        ))
    }
}
