use serde::Deserialize;

use crate::engine::AssignmentQuery;
use crate::error::{Error, Result};
use crate::types::ReviewKey;

#[derive(Debug, Default, Deserialize)]
pub struct AssignmentsParams {
    #[serde(default)]
    pub assignment_id: Option<String>,
    #[serde(default)]
    pub worker_id: Option<String>,
}

impl From<AssignmentsParams> for AssignmentQuery {
    fn from(params: AssignmentsParams) -> Self {
        Self {
            assignment_id: params.assignment_id,
            worker_id: params.worker_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MarksParams {
    #[serde(default)]
    pub worker_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewsParams {
    #[serde(default)]
    pub assignment_id: Option<String>,
    #[serde(default)]
    pub worker_id: Option<String>,
    #[serde(default)]
    pub reviewer_id: Option<String>,
}

impl ReviewsParams {
    /// `None` lists every review touching the caller; a key selects one review.
    pub fn key(self) -> Result<Option<ReviewKey>> {
        match (self.assignment_id, self.worker_id, self.reviewer_id) {
            (None, None, None) => Ok(None),
            (Some(assignment_id), Some(worker_id), Some(reviewer_id)) => {
                Ok(Some(ReviewKey::new(assignment_id, worker_id, reviewer_id)))
            }
            _ => Err(Error::BadRequest(
                "assignment_id, worker_id and reviewer_id must be given together".into(),
            )),
        }
    }
}
