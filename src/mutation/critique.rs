use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::input::{self, optional_bool, required_array, required_str};
use super::{PatchOutcome, check_covers, check_rubric, require_open};
use crate::error::{Error, Result};
use crate::relations::Graph;
use crate::store::Store;
use crate::temporal::resolve_submission;
use crate::types::{Critique, CritiqueKey, CritiqueState, CritiquedGrade, ReviewKey, Timestamp};
use crate::visibility::Caller;

fn critique_key(map: &serde_json::Map<String, Value>) -> Result<CritiqueKey> {
    let review = ReviewKey::new(
        required_str(map, "assignment_id")?,
        required_str(map, "worker_id")?,
        required_str(map, "reviewer_id")?,
    );
    Ok(review.critique(required_str(map, "critic_id")?))
}

/// A parsed `PATCH /critiques` body.
#[derive(Debug)]
pub struct CritiquePatch<'a> {
    key: CritiqueKey,
    submit: bool,
    critiqued_grades: &'a [Value],
}

#[derive(Debug)]
pub struct CritiqueWrite {
    critique: Critique,
    critiqued_grades: Vec<CritiquedGrade>,
    outcome: PatchOutcome,
}

impl<'a> CritiquePatch<'a> {
    pub fn parse(body: &'a Value) -> Result<Self> {
        let map = input::object(body, "body")?;
        Ok(Self {
            key: critique_key(map)?,
            submit: optional_bool(map, "submit")?,
            critiqued_grades: required_array(map, "critiqued_grades")?,
        })
    }

    /// The critiqued review's key; critique writes share the review's lock.
    #[must_use]
    pub fn review_key(&self) -> &ReviewKey {
        &self.key.review
    }

    pub fn validate(&self, caller: &Caller, graph: &Graph, now: Timestamp) -> Result<CritiqueWrite> {
        let key = &self.key;
        let review_key = &key.review;

        if !caller.is_admin && !caller.is(&key.critic_id) {
            return Err(Error::forbidden("only the critic may edit this critique"));
        }
        if key.critic_id == review_key.reviewer_id || key.critic_id == review_key.worker_id {
            return Err(Error::forbidden(
                "a review cannot be critiqued by its reviewer or its worker",
            ));
        }
        let assignment = graph
            .assignment(&review_key.assignment_id)
            .ok_or_else(|| Error::not_found("assignment not found"))?;
        if graph.user(&key.critic_id).is_none() {
            return Err(Error::not_found("critic not found"));
        }
        if !caller.is_admin {
            require_open(
                now,
                assignment.critiques_open,
                assignment.critiques_close,
                "critique",
            )?;
        }

        let review = graph
            .review(review_key)
            .ok_or_else(|| Error::not_found("review not found"))?;
        if !resolve_submission(review.submission_time, assignment.reviews_close, now).is_submitted() {
            return Err(Error::BadRequest("review has not been submitted".into()));
        }
        let existing = graph.critique(key);
        if !caller.is_admin && existing.is_some_and(|c| c.submission_time.is_some()) {
            return Err(Error::forbidden("critique already submitted"));
        }

        let entries = input::entries("critiqued_grades", self.critiqued_grades, "proposed_mark")?;
        check_rubric(graph, &review_key.assignment_id, "critiqued_grades", &entries)?;

        let mut critiqued_grades = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let grade = graph
                .grade(&review_key.grade(entry.criteria_id.as_str()))
                .ok_or_else(|| {
                    Error::validation(
                        format!("critiqued_grades[{i}].criteria_id"),
                        format!("no grade for {} to critique", entry.criteria_id),
                    )
                })?;
            // An unchanged proposal keeps any decision already recorded on it.
            let previous = graph
                .critiqued_grade(&key.critiqued_grade(entry.criteria_id.as_str()))
                .filter(|cg| cg.proposed_mark == Some(entry.mark));
            let state = match previous {
                Some(cg) => cg.state,
                None if grade.mark == Some(entry.mark) => CritiqueState::Agreeing,
                None => CritiqueState::Submitted,
            };
            critiqued_grades.push(CritiquedGrade {
                assignment_id: review_key.assignment_id.clone(),
                worker_id: review_key.worker_id.clone(),
                reviewer_id: review_key.reviewer_id.clone(),
                critic_id: key.critic_id.clone(),
                criteria_id: entry.criteria_id.clone(),
                proposed_mark: Some(entry.mark),
                comment: Some(entry.comment.clone()),
                state,
            });
        }

        if self.submit {
            let rubric = graph
                .assignment_tree(&review_key.assignment_id)
                .ok_or_else(|| Error::not_found("assignment not found"))?;
            let graded = rubric
                .rubric_pairs()
                .map(|(_, c)| c)
                .filter(|c| graph.grade(&review_key.grade(*c)).is_some());
            check_covers("critiqued_grades", graded, &entries)?;

            if let Some(i) = entries.iter().position(|e| e.comment.is_empty()) {
                return Err(Error::validation(
                    format!("critiqued_grades[{i}].comment"),
                    "required to submit",
                ));
            }
        }

        let stored = existing.and_then(|c| c.submission_time);
        let submission_time = if self.submit {
            resolve_submission(stored, assignment.critiques_close, now)
                .time
                .or(Some(now))
        } else {
            stored
        };

        Ok(CritiqueWrite {
            critique: Critique {
                submission_time,
                ..Critique::draft(key)
            },
            critiqued_grades,
            outcome: PatchOutcome {
                submission_time: submission_time.filter(|_| self.submit),
            },
        })
    }
}

impl CritiqueWrite {
    pub fn apply(self, store: &dyn Store) -> Result<PatchOutcome> {
        store.apply_critique_patch(&self.critique, &self.critiqued_grades)?;
        tracing::debug!(
            "Wrote critique {} with {} critiqued grades",
            self.critique.key(),
            self.critiqued_grades.len()
        );
        Ok(self.outcome)
    }
}

/// A parsed `POST /critiques/responses` body: the reviewer's decision on
/// each pending proposal.
#[derive(Debug)]
pub struct CritiqueResponses<'a> {
    key: CritiqueKey,
    responses: &'a [Value],
}

#[derive(Debug)]
pub struct ResponsesWrite {
    critiqued_grades: Vec<CritiquedGrade>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RespondOutcome {
    pub updated: usize,
}

impl<'a> CritiqueResponses<'a> {
    pub fn parse(body: &'a Value) -> Result<Self> {
        let map = input::object(body, "body")?;
        Ok(Self {
            key: critique_key(map)?,
            responses: required_array(map, "responses")?,
        })
    }

    #[must_use]
    pub fn review_key(&self) -> &ReviewKey {
        &self.key.review
    }

    pub fn validate(&self, caller: &Caller, graph: &Graph, now: Timestamp) -> Result<ResponsesWrite> {
        let key = &self.key;

        if !caller.is_admin && !caller.is(&key.review.reviewer_id) {
            return Err(Error::forbidden("only the reviewer may respond to critiques"));
        }
        let assignment = graph
            .assignment(&key.review.assignment_id)
            .ok_or_else(|| Error::not_found("assignment not found"))?;
        if !caller.is_admin && now >= assignment.results_publish {
            return Err(Error::forbidden("results already published"));
        }

        let critique = graph
            .critique(key)
            .ok_or_else(|| Error::not_found("critique not found"))?;
        if !resolve_submission(critique.submission_time, assignment.critiques_close, now)
            .is_submitted()
        {
            return Err(Error::BadRequest("critique has not been submitted".into()));
        }

        let mut decisions = Vec::with_capacity(self.responses.len());
        for (i, item) in self.responses.iter().enumerate() {
            let map = input::object(item, &format!("responses[{i}]"))?;
            let criteria_id = match map.get("criteria_id") {
                Some(Value::String(s)) => s.clone(),
                _ => {
                    return Err(Error::validation(
                        format!("responses[{i}].criteria_id"),
                        "expected a string",
                    ));
                }
            };
            let accept = match map.get("accept") {
                Some(Value::Bool(b)) => *b,
                _ => {
                    return Err(Error::validation(
                        format!("responses[{i}].accept"),
                        "expected a boolean",
                    ));
                }
            };
            decisions.push((i, criteria_id, accept));
        }

        let mut critiqued_grades = Vec::with_capacity(decisions.len());
        for (i, criteria_id, accept) in &decisions {
            let field = format!("responses[{i}].criteria_id");
            let target = graph
                .critiqued_grade(&key.critiqued_grade(criteria_id.as_str()))
                .ok_or_else(|| Error::validation(&field, format!("no proposal for {criteria_id}")))?;
            if target.state != CritiqueState::Submitted {
                return Err(Error::validation(
                    &field,
                    format!("proposal for {criteria_id} is {}", target.state),
                ));
            }
            critiqued_grades.push(CritiquedGrade {
                state: if *accept {
                    CritiqueState::Accepted
                } else {
                    CritiqueState::Rejected
                },
                ..target.clone()
            });
        }

        let mut seen = HashSet::new();
        if let Some((_, criteria_id, _)) = decisions.iter().find(|(_, c, _)| !seen.insert(c.as_str())) {
            return Err(Error::validation(
                "responses",
                format!("duplicate criteria {criteria_id}"),
            ));
        }

        Ok(ResponsesWrite { critiqued_grades })
    }
}

impl ResponsesWrite {
    pub fn apply(self, store: &dyn Store) -> Result<RespondOutcome> {
        store.apply_critique_responses(&self.critiqued_grades)?;
        Ok(RespondOutcome {
            updated: self.critiqued_grades.len(),
        })
    }
}
