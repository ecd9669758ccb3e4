//! Period and submission state derived from the clock.
//!
//! Every boundary is half-open: a period is open on `[open_at, close_at)`.

use serde::Serialize;

use crate::types::{Assignment, CritiqueState, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodState {
    NotOpen,
    OpenSoon,
    Open,
    Closed,
}

impl PeriodState {
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, PeriodState::Open)
    }
}

/// Classifies `now` against a period. `OpenSoon` only when
/// `now < open_at <= now + soon_window`.
#[must_use]
pub fn resolve_period_state(
    now: Timestamp,
    open_at: Timestamp,
    close_at: Timestamp,
    soon_window: i64,
) -> PeriodState {
    if now >= close_at {
        PeriodState::Closed
    } else if now >= open_at {
        PeriodState::Open
    } else if open_at <= now.saturating_add(soon_window) {
        PeriodState::OpenSoon
    } else {
        PeriodState::NotOpen
    }
}

/// Effective submission of a review or critique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub time: Option<Timestamp>,
    pub auto_submitted: bool,
}

impl Submission {
    #[must_use]
    pub const fn is_submitted(&self) -> bool {
        self.time.is_some()
    }
}

/// Auto-submits on close: an unsubmitted record read at or after `close_at`
/// counts as submitted at `close_at`. Explicit submissions are never altered.
#[must_use]
pub fn resolve_submission(
    submission_time: Option<Timestamp>,
    close_at: Timestamp,
    now: Timestamp,
) -> Submission {
    match submission_time {
        Some(time) => Submission {
            time: Some(time),
            auto_submitted: false,
        },
        None if now >= close_at => Submission {
            time: Some(close_at),
            auto_submitted: true,
        },
        None => Submission {
            time: None,
            auto_submitted: false,
        },
    }
}

/// A proposal still awaiting the reviewer once results are published is auto-rejected.
#[must_use]
pub fn resolve_critique_state(
    state: CritiqueState,
    results_publish: Timestamp,
    now: Timestamp,
) -> CritiqueState {
    if state.is_pending() && now >= results_publish {
        CritiqueState::AutoRejected
    } else {
        state
    }
}

/// Every period of an assignment, as seen at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Periods {
    pub submission: PeriodState,
    pub reviews: PeriodState,
    pub critiques: PeriodState,
    pub results: PeriodState,
}

impl Periods {
    #[must_use]
    pub fn at(assignment: &Assignment, now: Timestamp, soon_window: i64) -> Self {
        Self {
            submission: resolve_period_state(
                now,
                assignment.submission_open,
                assignment.submission_close,
                soon_window,
            ),
            reviews: resolve_period_state(
                now,
                assignment.reviews_open,
                assignment.reviews_close,
                soon_window,
            ),
            critiques: resolve_period_state(
                now,
                assignment.critiques_open,
                assignment.critiques_close,
                soon_window,
            ),
            // Results never close once published.
            results: resolve_period_state(
                now,
                assignment.results_publish,
                Timestamp::MAX,
                soon_window,
            ),
        }
    }
}

#[must_use]
pub fn results_published(assignment: &Assignment, now: Timestamp) -> bool {
    now >= assignment.results_publish
}
