//! The operations exposed to the HTTP layer.
//!
//! Every read resolves against a single graph and a single `now`; every
//! write holds the target review's lock across validate and apply.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::TimingConfig;
use crate::error::{Error, Result};
use crate::marks::{self, MarkInputs, WorkMarks};
use crate::mutation::{
    CritiquePatch, CritiqueResponses, KeyedLocks, PatchOutcome, RespondOutcome, ReviewPatch,
};
use crate::relations::{Graph, GraphCache, ReadView};
use crate::store::Store;
use crate::temporal::{Periods, results_published};
use crate::types::{ReviewKey, Timestamp};
use crate::visibility::{self, AssignmentView, Caller, ReviewRole, ReviewView};

/// Optional scoping for [`Engine::get_assignments_for`].
#[derive(Debug, Clone, Default)]
pub struct AssignmentQuery {
    pub assignment_id: Option<String>,
    pub worker_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Assignments {
    One(AssignmentView),
    Many(Vec<AssignmentView>),
}

/// Reviews touching the caller, split by the role they play in each.
#[derive(Debug, Default, Serialize)]
pub struct ReviewsByRole {
    pub worker: Vec<ReviewView>,
    pub reviewer: Vec<ReviewView>,
    pub critic: Vec<ReviewView>,
}

pub struct Engine {
    store: Arc<dyn Store>,
    graphs: GraphCache,
    locks: KeyedLocks<ReviewKey>,
    timing: TimingConfig,
}

/// Rejected writes are logged here; fatal faults are logged at the HTTP boundary.
fn warn_rejected(what: &str, caller: &Caller, err: &Error) {
    if !err.is_fatal() {
        tracing::warn!("Rejected {what} from {}: {err}", caller.user_id);
    }
}

fn non_empty(value: Option<&str>, field: &str) -> Result<Option<String>> {
    match value {
        Some("") => Err(Error::BadRequest(format!("{field} cannot be empty"))),
        other => Ok(other.map(str::to_string)),
    }
}

impl Engine {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, timing: TimingConfig) -> Self {
        Self {
            store,
            graphs: GraphCache::new(),
            locks: KeyedLocks::new(),
            timing,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    #[must_use]
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    fn graph(&self) -> Result<Arc<Graph>> {
        self.graphs.get(self.store.as_ref())
    }

    pub fn get_assignments_for(
        &self,
        caller: &Caller,
        query: &AssignmentQuery,
        now: Timestamp,
    ) -> Result<Assignments> {
        let assignment_id = non_empty(query.assignment_id.as_deref(), "assignment_id")?;
        let worker_id = non_empty(query.worker_id.as_deref(), "worker_id")?;

        if !caller.is_admin && worker_id.as_deref().is_some_and(|w| !caller.is(w)) {
            return Err(Error::forbidden("cannot view another worker's assignments"));
        }

        let graph = self.graph()?;
        let soon = self.timing.soon_window_secs;

        if let Some(assignment_id) = assignment_id {
            let tree = graph
                .assignment_tree(&assignment_id)
                .ok_or_else(|| Error::not_found("assignment not found"))?;
            let periods = Periods::at(&tree.assignment, now, soon);
            let view = visibility::filter_assignment(caller, tree, worker_id.as_deref(), periods)?;
            return Ok(Assignments::One(view));
        }

        // Without an id, list the assignments the (scoped) worker takes part in.
        let participant = worker_id.as_deref().or((!caller.is_admin).then_some(caller.user_id.as_str()));
        let mut views = Vec::new();
        for assignment in graph.assignments() {
            let tree = match graph.assignment_tree(&assignment.assignment_id) {
                Some(tree) => tree,
                None => continue,
            };
            if participant.is_some_and(|w| tree.work_of(w).is_none()) {
                continue;
            }
            let periods = Periods::at(&tree.assignment, now, soon);
            views.push(visibility::filter_assignment(caller, tree, participant, periods)?);
        }
        Ok(Assignments::Many(views))
    }

    pub fn get_reviews_for(&self, caller: &Caller, now: Timestamp) -> Result<ReviewsByRole> {
        let graph = self.graph()?;
        let reads = ReadView::new(&graph, now);
        let published = |assignment_id: &str| {
            graph
                .assignment(assignment_id)
                .is_some_and(|a| results_published(a, now))
        };

        // Workers only see reviews of their work once results are out.
        let worker = reads
            .reviews_where(|k| caller.is(&k.worker_id) && published(&k.assignment_id))
            .into_iter()
            .filter(|r| r.is_submitted())
            .map(|r| visibility::view_review_as(caller, r, ReviewRole::Worker, true))
            .collect();

        let reviewer = reads
            .reviews_where(|k| caller.is(&k.reviewer_id))
            .into_iter()
            .map(|r| {
                let results_mode = published(&r.review.assignment_id);
                visibility::view_review_as(caller, r, ReviewRole::Reviewer, results_mode)
            })
            .collect();

        let critic = reads
            .reviews_where(|k| graph.critique(&k.critique(caller.user_id.as_str())).is_some())
            .into_iter()
            .map(|r| visibility::view_review_as(caller, r, ReviewRole::Critic, false))
            .collect();

        Ok(ReviewsByRole {
            worker,
            reviewer,
            critic,
        })
    }

    /// One review, shaped by the caller's strongest role on it.
    pub fn get_review(&self, caller: &Caller, key: &ReviewKey, now: Timestamp) -> Result<ReviewView> {
        let graph = self.graph()?;
        let review = ReadView::new(&graph, now)
            .review(key)
            .ok_or_else(|| Error::not_found("review not found"))?;
        let published = graph
            .assignment(&key.assignment_id)
            .is_some_and(|a| results_published(a, now));

        if visibility::review_role(caller, &review) == Some(ReviewRole::Worker) && !published {
            return Err(Error::forbidden("results are not published yet"));
        }
        visibility::filter_review(caller, review, published)
    }

    pub fn patch_review(&self, caller: &Caller, body: &Value, now: Timestamp) -> Result<PatchOutcome> {
        let patch =
            ReviewPatch::parse(body).inspect_err(|e| warn_rejected("review patch", caller, e))?;
        self.locks
            .with(patch.key(), || {
                let graph = self.graph()?;
                patch.validate(caller, &graph, now)?.apply(self.store.as_ref())
            })
            .inspect_err(|e| warn_rejected("review patch", caller, e))
    }

    pub fn patch_critique(&self, caller: &Caller, body: &Value, now: Timestamp) -> Result<PatchOutcome> {
        let patch =
            CritiquePatch::parse(body).inspect_err(|e| warn_rejected("critique patch", caller, e))?;
        self.locks
            .with(patch.review_key(), || {
                let graph = self.graph()?;
                patch.validate(caller, &graph, now)?.apply(self.store.as_ref())
            })
            .inspect_err(|e| warn_rejected("critique patch", caller, e))
    }

    pub fn respond_critique(
        &self,
        caller: &Caller,
        body: &Value,
        now: Timestamp,
    ) -> Result<RespondOutcome> {
        let responses = CritiqueResponses::parse(body)
            .inspect_err(|e| warn_rejected("critique responses", caller, e))?;
        self.locks
            .with(responses.review_key(), || {
                let graph = self.graph()?;
                responses.validate(caller, &graph, now)?.apply(self.store.as_ref())
            })
            .inspect_err(|e| warn_rejected("critique responses", caller, e))
    }

    /// Marks for one worker: any worker for admins, otherwise only the
    /// caller's own and only once results are published.
    pub fn get_marks_for(
        &self,
        caller: &Caller,
        assignment_id: &str,
        worker_id: Option<&str>,
        now: Timestamp,
    ) -> Result<WorkMarks> {
        let worker_id = non_empty(worker_id, "worker_id")?;
        let worker_id = worker_id.as_deref().unwrap_or(&caller.user_id);
        if !caller.is_admin && !caller.is(worker_id) {
            return Err(Error::forbidden("cannot view another worker's marks"));
        }

        let graph = self.graph()?;
        let rubric = graph
            .assignment_tree(assignment_id)
            .ok_or_else(|| Error::not_found("assignment not found"))?;
        if !caller.is_admin && !results_published(&rubric.assignment, now) {
            return Err(Error::forbidden("results are not published yet"));
        }
        if rubric.work_of(worker_id).is_none() {
            return Err(Error::not_found("work not found"));
        }

        let reads = ReadView::new(&graph, now);
        let in_assignment = |k: &ReviewKey| k.assignment_id == assignment_id;
        let received = reads.reviews_where(|k| in_assignment(k) && k.worker_id == worker_id);
        let authored = reads.reviews_where(|k| in_assignment(k) && k.reviewer_id == worker_id);
        let critiqued = reads
            .reviews_where(|k| in_assignment(k) && graph.critique(&k.critique(worker_id)).is_some());

        marks::work_marks(&MarkInputs {
            rubric: &rubric,
            worker_id,
            received: &received,
            authored: &authored,
            critiqued: &critiqued,
        })
    }
}
