use serde_json::Value;

use super::input::{self, optional_bool, optional_comment, required_array, required_str};
use super::{PatchOutcome, check_covers, check_rubric, require_open};
use crate::error::{Error, Result};
use crate::relations::Graph;
use crate::store::Store;
use crate::temporal::resolve_submission;
use crate::types::{Grade, Review, ReviewKey, Timestamp};
use crate::visibility::Caller;

/// A parsed `PATCH /reviews` body.
#[derive(Debug)]
pub struct ReviewPatch<'a> {
    key: ReviewKey,
    submit: bool,
    comment: Option<String>,
    grades: &'a [Value],
}

/// A validated review write, ready to apply.
#[derive(Debug)]
pub struct ReviewWrite {
    review: Review,
    grades: Vec<Grade>,
    outcome: PatchOutcome,
}

impl<'a> ReviewPatch<'a> {
    /// Checks that the required fields are present and typed. Grade entries
    /// are only checked by [`ReviewPatch::validate`].
    pub fn parse(body: &'a Value) -> Result<Self> {
        let map = input::object(body, "body")?;
        let key = ReviewKey::new(
            required_str(map, "assignment_id")?,
            required_str(map, "worker_id")?,
            required_str(map, "reviewer_id")?,
        );
        Ok(Self {
            key,
            submit: optional_bool(map, "submit")?,
            comment: optional_comment(map, "comment")?,
            grades: required_array(map, "grades")?,
        })
    }

    #[must_use]
    pub fn key(&self) -> &ReviewKey {
        &self.key
    }

    pub fn validate(&self, caller: &Caller, graph: &Graph, now: Timestamp) -> Result<ReviewWrite> {
        let key = &self.key;

        if !caller.is_admin && !caller.is(&key.reviewer_id) {
            return Err(Error::forbidden("only the reviewer may edit this review"));
        }
        let assignment = graph
            .assignment(&key.assignment_id)
            .ok_or_else(|| Error::not_found("assignment not found"))?;
        if !caller.is_admin {
            require_open(now, assignment.reviews_open, assignment.reviews_close, "review")?;
        }

        let existing = graph
            .review(key)
            .ok_or_else(|| Error::not_found("review not found"))?;
        if !caller.is_admin && existing.submission_time.is_some() {
            return Err(Error::forbidden("review already submitted"));
        }

        let entries = input::entries("grades", self.grades, "mark")?;
        check_rubric(graph, &key.assignment_id, "grades", &entries)?;

        let comment = self.comment.clone().or_else(|| existing.comment.clone());
        if self.submit {
            if comment.as_deref().is_none_or(str::is_empty) {
                return Err(Error::validation("comment", "required to submit"));
            }
            let rubric = graph
                .assignment_tree(&key.assignment_id)
                .ok_or_else(|| Error::not_found("assignment not found"))?;
            check_covers("grades", rubric.rubric_pairs().map(|(_, c)| c), &entries)?;
        }

        // Submitting never moves an existing or auto-submitted time.
        let submission_time = if self.submit {
            resolve_submission(existing.submission_time, assignment.reviews_close, now)
                .time
                .or(Some(now))
        } else {
            existing.submission_time
        };

        let grades = entries
            .into_iter()
            .map(|entry| Grade {
                assignment_id: key.assignment_id.clone(),
                worker_id: key.worker_id.clone(),
                reviewer_id: key.reviewer_id.clone(),
                criteria_id: entry.criteria_id,
                mark: Some(entry.mark),
                comment: Some(entry.comment),
            })
            .collect();

        Ok(ReviewWrite {
            review: Review {
                comment,
                submission_time,
                ..Review::draft(key)
            },
            grades,
            outcome: PatchOutcome {
                submission_time: submission_time.filter(|_| self.submit),
            },
        })
    }
}

impl ReviewWrite {
    pub fn apply(self, store: &dyn Store) -> Result<PatchOutcome> {
        store.apply_review_patch(&self.review, &self.grades)?;
        tracing::debug!(
            "Wrote review {} with {} grades",
            self.review.key(),
            self.grades.len()
        );
        Ok(self.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Tables};
    use crate::testing::fixture::{self, REVIEWS_CLOSE, REVIEWS_OPEN};
    use serde_json::json;

    const NOW: Timestamp = REVIEWS_OPEN + 100;

    fn full_grades() -> Value {
        json!([
            {"category_id": "writing", "criteria_id": "clarity", "mark": 0.7, "comment": "ok"},
            {"category_id": "writing", "criteria_id": "structure", "mark": 0.5, "comment": "ok"},
            {"category_id": "content", "criteria_id": "accuracy", "mark": 0.9, "comment": "ok"},
        ])
    }

    fn body(submit: bool, grades: Value) -> Value {
        json!({
            "assignment_id": fixture::ASSIGNMENT,
            "worker_id": "wendy",
            "reviewer_id": "rob",
            "comment": "Decent <b>effort</b>",
            "submit": submit,
            "grades": grades,
        })
    }

    fn run(tables: Tables, caller: &Caller, body: &Value, now: Timestamp) -> (MemoryStore, Result<PatchOutcome>) {
        let store = MemoryStore::new(tables);
        let result = (|| {
            let patch = ReviewPatch::parse(body)?;
            let graph = Graph::build(&store.snapshot()?.tables)?;
            patch.validate(caller, &graph, now)?.apply(&store)
        })();
        (store, result)
    }

    fn rob_grades(store: &MemoryStore) -> Vec<Grade> {
        store
            .snapshot()
            .unwrap()
            .tables
            .grades
            .iter()
            .filter(|g| g.reviewer_id == "rob")
            .cloned()
            .collect()
    }

    #[test]
    fn test_submit_sets_time_and_upserts() {
        let (store, result) = run(fixture::tables(), &fixture::caller("rob"), &body(true, full_grades()), NOW);
        assert_eq!(result.unwrap().submission_time, Some(NOW));

        let review = store
            .get_review(&fixture::review_key("wendy", "rob"))
            .unwrap()
            .unwrap();
        assert_eq!(review.submission_time, Some(NOW));
        assert_eq!(review.comment.as_deref(), Some("Decent &lt;b&gt;effort&lt;/b&gt;"));

        let grades = rob_grades(&store);
        assert_eq!(grades.len(), 3);
        let clarity = grades.iter().find(|g| g.criteria_id == "clarity").unwrap();
        assert_eq!(clarity.mark, Some(0.7));
    }

    #[test]
    fn test_draft_save_returns_empty_outcome() {
        let grades = json!([
            {"category_id": "writing", "criteria_id": "clarity", "mark": 0.1, "comment": ""},
        ]);
        let (store, result) = run(fixture::tables(), &fixture::caller("rob"), &body(false, grades), NOW);
        assert_eq!(result.unwrap(), PatchOutcome::default());
        assert_eq!(serde_json::to_value(PatchOutcome::default()).unwrap(), json!({}));

        let clarity = rob_grades(&store)
            .into_iter()
            .find(|g| g.criteria_id == "clarity")
            .unwrap();
        assert_eq!(clarity.mark, Some(0.1));
    }

    #[test]
    fn test_submit_without_full_coverage_writes_nothing() {
        let grades = json!([
            {"category_id": "writing", "criteria_id": "clarity", "mark": 0.0, "comment": "x"},
            {"category_id": "writing", "criteria_id": "structure", "mark": 0.0, "comment": "x"},
        ]);
        let before = rob_grades(&MemoryStore::new(fixture::tables()));
        let (store, result) = run(fixture::tables(), &fixture::caller("rob"), &body(true, grades), NOW);

        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "grades"));
        assert_eq!(rob_grades(&store), before);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_submit_requires_comment() {
        let mut body = body(true, full_grades());
        body["comment"] = json!("");
        let (_, result) = run(fixture::tables(), &fixture::caller("rob"), &body, NOW);
        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "comment"));
    }

    #[test]
    fn test_missing_field_reported_first() {
        let body = json!({"assignment_id": fixture::ASSIGNMENT, "worker_id": "wendy", "grades": []});
        let (_, result) = run(fixture::tables(), &fixture::caller("carl"), &body, NOW);
        assert!(matches!(result, Err(Error::Validation { ref field, .. }) if field == "reviewer_id"));
    }

    #[test]
    fn test_privilege_checked_before_grades() {
        let (_, result) = run(
            fixture::tables(),
            &fixture::caller("carl"),
            &body(false, json!([{"bad": true}])),
            NOW,
        );
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }

    #[test]
    fn test_closed_window_rejects_reviewer_not_admin() {
        let (_, result) = run(
            fixture::tables(),
            &fixture::caller("rob"),
            &body(false, full_grades()),
            REVIEWS_CLOSE,
        );
        assert!(matches!(result, Err(Error::Forbidden(_))));

        let (_, result) = run(
            fixture::tables(),
            &fixture::admin(),
            &body(false, full_grades()),
            REVIEWS_CLOSE + 1,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_admin_submit_keeps_existing_time() {
        let mut body = body(true, full_grades());
        body["reviewer_id"] = json!("rita");
        let (store, result) = run(fixture::tables(), &fixture::admin(), &body, NOW);
        assert_eq!(result.unwrap().submission_time, Some(REVIEWS_CLOSE - 500));

        let review = store
            .get_review(&fixture::review_key("wendy", "rita"))
            .unwrap()
            .unwrap();
        assert_eq!(review.submission_time, Some(REVIEWS_CLOSE - 500));
    }

    #[test]
    fn test_admin_submit_after_close_keeps_auto_submit_time() {
        let (store, result) = run(
            fixture::tables(),
            &fixture::admin(),
            &body(true, full_grades()),
            REVIEWS_CLOSE + 100,
        );
        assert_eq!(result.unwrap().submission_time, Some(REVIEWS_CLOSE));

        let review = store
            .get_review(&fixture::review_key("wendy", "rob"))
            .unwrap()
            .unwrap();
        assert_eq!(review.submission_time, Some(REVIEWS_CLOSE));
    }

    #[test]
    fn test_submitted_review_locked_for_reviewer() {
        let mut body = body(false, full_grades());
        body["reviewer_id"] = json!("rita");
        let (_, result) = run(fixture::tables(), &fixture::caller("rita"), &body, NOW);
        assert!(matches!(result, Err(Error::Forbidden(ref m)) if m.contains("submitted")));
    }

    #[test]
    fn test_unknown_review_not_found() {
        let mut body = body(false, full_grades());
        body["worker_id"] = json!("carl");
        let (_, result) = run(fixture::tables(), &fixture::caller("rob"), &body, NOW);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_orphan_reported_before_duplicate() {
        let grades = json!([
            {"category_id": "writing", "criteria_id": "clarity", "mark": 0.1, "comment": "a"},
            {"category_id": "writing", "criteria_id": "clarity", "mark": 0.2, "comment": "b"},
            {"category_id": "writing", "criteria_id": "style", "mark": 0.3, "comment": "c"},
        ]);
        let (_, result) = run(fixture::tables(), &fixture::caller("rob"), &body(false, grades), NOW);
        assert!(matches!(result, Err(Error::Validation { ref reason, .. }) if reason.contains("unknown")));

        let grades = json!([
            {"category_id": "writing", "criteria_id": "clarity", "mark": 0.1, "comment": "a"},
            {"category_id": "writing", "criteria_id": "clarity", "mark": 0.2, "comment": "b"},
        ]);
        let (_, result) = run(fixture::tables(), &fixture::caller("rob"), &body(false, grades), NOW);
        assert!(matches!(result, Err(Error::Validation { ref reason, .. }) if reason.contains("duplicate")));
    }

    #[test]
    fn test_criteria_in_wrong_category_is_orphan() {
        let grades = json!([
            {"category_id": "content", "criteria_id": "clarity", "mark": 0.1, "comment": "a"},
        ]);
        let (_, result) = run(fixture::tables(), &fixture::caller("rob"), &body(false, grades), NOW);
        assert!(matches!(result, Err(Error::Validation { .. })));
    }
}
