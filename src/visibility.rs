//! Role-based selection and redaction of joined trees.
//!
//! Every function here consumes a resolved tree and returns a reduced copy.
//! Callers with no role on the requested entity are denied, never handed an
//! empty view.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::relations::{JoinedAssignment, JoinedCategory, JoinedCritique, JoinedReview};
use crate::temporal::Periods;
use crate::types::*;

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

impl Caller {
    #[must_use]
    pub fn is(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

/// A user as embedded in someone else's payload. `email` is only filled for admins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicUser {
    pub user_id: String,
    pub display_name: String,
    pub identicon: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl PublicUser {
    #[must_use]
    pub fn redacted(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            display_name: user.display_name.clone(),
            identicon: user.identicon.clone(),
            email: None,
        }
    }

    #[must_use]
    fn for_caller(user: &User, caller: &Caller) -> Self {
        let mut public = Self::redacted(user);
        if caller.is_admin {
            public.email = Some(user.email.clone());
        }
        public
    }
}

/// How the caller relates to a review, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewRole {
    Admin,
    Worker,
    Reviewer,
    Critic,
}

#[must_use]
pub fn review_role(caller: &Caller, review: &JoinedReview) -> Option<ReviewRole> {
    if caller.is_admin {
        Some(ReviewRole::Admin)
    } else if caller.is(&review.review.worker_id) {
        Some(ReviewRole::Worker)
    } else if caller.is(&review.review.reviewer_id) {
        Some(ReviewRole::Reviewer)
    } else if review.critique_by(&caller.user_id).is_some() {
        Some(ReviewRole::Critic)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CritiqueView {
    pub critic_id: String,
    pub critic: PublicUser,
    pub submission_time: Option<Timestamp>,
    pub auto_submitted: bool,
    pub is_complete: bool,
    pub critiqued_grades: Vec<CritiquedGrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    pub assignment_id: String,
    pub worker_id: String,
    pub reviewer_id: String,
    pub reviewer: PublicUser,
    pub work: Work,
    pub comment: Option<String>,
    pub submission_time: Option<Timestamp>,
    pub auto_submitted: bool,
    pub is_complete: bool,
    pub grades: Vec<Grade>,
    pub critiques: Vec<CritiqueView>,
}

fn critique_view(critique: JoinedCritique, caller: &Caller) -> CritiqueView {
    CritiqueView {
        critic_id: critique.critique.critic_id,
        critic: PublicUser::for_caller(&critique.critic, caller),
        submission_time: critique.critique.submission_time,
        auto_submitted: critique.auto_submitted,
        is_complete: critique.is_complete,
        critiqued_grades: critique.critiqued_grades,
    }
}

/// Shapes `review` for `caller` acting in `role`.
///
/// `results_mode` drops critiques that were never submitted from the views
/// of the worker and the reviewer.
#[must_use]
pub fn view_review_as(
    caller: &Caller,
    review: JoinedReview,
    role: ReviewRole,
    results_mode: bool,
) -> ReviewView {
    let role = if caller.is_admin { ReviewRole::Admin } else { role };
    let reviewer = PublicUser::for_caller(&review.reviewer, caller);

    let mut comment = review.review.comment;
    let critiques: Vec<JoinedCritique> = match role {
        ReviewRole::Admin => review.critiques,
        ReviewRole::Worker | ReviewRole::Reviewer => review
            .critiques
            .into_iter()
            .filter(|c| !results_mode || c.is_submitted())
            .collect(),
        ReviewRole::Critic => {
            comment = None;
            review
                .critiques
                .into_iter()
                .filter(|c| caller.is(&c.critique.critic_id))
                .collect()
        }
    };

    ReviewView {
        assignment_id: review.review.assignment_id,
        worker_id: review.review.worker_id,
        reviewer_id: review.review.reviewer_id,
        reviewer,
        work: review.work,
        comment,
        submission_time: review.review.submission_time,
        auto_submitted: review.auto_submitted,
        is_complete: review.is_complete,
        grades: review.grades,
        critiques: critiques
            .into_iter()
            .map(|c| critique_view(c, caller))
            .collect(),
    }
}

/// Picks the caller's strongest role on `review` and shapes it accordingly.
pub fn filter_review(caller: &Caller, review: JoinedReview, results_mode: bool) -> Result<ReviewView> {
    let role = review_role(caller, &review)
        .ok_or_else(|| Error::forbidden("no access to this review"))?;
    Ok(view_review_as(caller, review, role, results_mode))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: MarkingCategory,
    pub criteria: Vec<MarkingCriteria>,
}

impl From<JoinedCategory> for CategoryView {
    fn from(joined: JoinedCategory) -> Self {
        Self {
            category: joined.category,
            criteria: joined.criteria,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub periods: Periods,
    pub categories: Vec<CategoryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work: Option<Work>,
    /// Only ever present for admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub works: Option<Vec<Work>>,
}

/// Admins see every work (or the one they scoped to); anyone else sees only
/// their own work merged in, and only for assignments they take part in.
pub fn filter_assignment(
    caller: &Caller,
    tree: JoinedAssignment,
    worker_id: Option<&str>,
    periods: Periods,
) -> Result<AssignmentView> {
    let categories = tree.categories.into_iter().map(CategoryView::from).collect();

    let (work, works) = if caller.is_admin {
        match worker_id {
            Some(worker_id) => {
                let work = tree
                    .works
                    .into_iter()
                    .find(|w| w.worker_id == worker_id)
                    .ok_or_else(|| Error::not_found("work not found"))?;
                (Some(work), None)
            }
            None => (None, Some(tree.works)),
        }
    } else {
        if worker_id.is_some_and(|w| !caller.is(w)) {
            return Err(Error::forbidden("cannot view another worker's assignment"));
        }
        let work = tree
            .works
            .into_iter()
            .find(|w| caller.is(&w.worker_id))
            .ok_or_else(|| Error::forbidden("not a participant in this assignment"))?;
        (Some(work), None)
    };

    Ok(AssignmentView {
        assignment: tree.assignment,
        periods,
        categories,
        work,
        works,
    })
}
