use std::collections::HashMap;

use super::{Graph, JoinedAssignment, JoinedReview};
use crate::marks;
use crate::temporal::{resolve_critique_state, resolve_submission};
use crate::types::{ReviewKey, Timestamp};

/// The graph as seen at one instant.
///
/// Every review read goes through here, so auto-submission, auto-rejection
/// and completeness are derived the same way on every path.
pub struct ReadView<'g> {
    graph: &'g Graph,
    now: Timestamp,
}

impl<'g> ReadView<'g> {
    #[must_use]
    pub fn new(graph: &'g Graph, now: Timestamp) -> Self {
        Self { graph, now }
    }

    #[must_use]
    pub fn assignment(&self, assignment_id: &str) -> Option<JoinedAssignment> {
        self.graph.assignment_tree(assignment_id)
    }

    #[must_use]
    pub fn review(&self, key: &ReviewKey) -> Option<JoinedReview> {
        let rubric = self.graph.assignment_tree(&key.assignment_id)?;
        let mut tree = self.graph.review_tree(key)?;
        self.resolve(&mut tree, &rubric);
        Some(tree)
    }

    /// Resolved trees for every review key matching `pred`, in store order.
    pub fn reviews_where<P>(&self, pred: P) -> Vec<JoinedReview>
    where
        P: Fn(&ReviewKey) -> bool,
    {
        let mut rubrics: HashMap<&str, JoinedAssignment> = HashMap::new();
        let mut out = Vec::new();

        for key in self.graph.review_keys().filter(|k| pred(k)) {
            let assignment_id = key.assignment_id.as_str();
            if !rubrics.contains_key(assignment_id) {
                let Some(tree) = self.graph.assignment_tree(assignment_id) else {
                    continue;
                };
                rubrics.insert(assignment_id, tree);
            }
            if let Some(mut tree) = self.graph.review_tree(key) {
                self.resolve(&mut tree, &rubrics[assignment_id]);
                out.push(tree);
            }
        }

        out
    }

    fn resolve(&self, tree: &mut JoinedReview, rubric: &JoinedAssignment) {
        let assignment = &rubric.assignment;

        let submission =
            resolve_submission(tree.review.submission_time, assignment.reviews_close, self.now);
        tree.review.submission_time = submission.time;
        tree.auto_submitted = submission.auto_submitted;
        tree.is_complete = marks::review_is_complete(
            tree.review.comment.as_deref(),
            &rubric.categories,
            &tree.grades,
        );

        for critique in &mut tree.critiques {
            let submission = resolve_submission(
                critique.critique.submission_time,
                assignment.critiques_close,
                self.now,
            );
            critique.critique.submission_time = submission.time;
            critique.auto_submitted = submission.auto_submitted;

            for critiqued in &mut critique.critiqued_grades {
                critiqued.state =
                    resolve_critique_state(critiqued.state, assignment.results_publish, self.now);
            }

            critique.is_complete = marks::critique_is_complete(
                &rubric.categories,
                &tree.grades,
                &critique.critiqued_grades,
            );
        }
    }
}
