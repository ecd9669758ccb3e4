use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CategoryKey, CriteriaKey, CritiqueKey, CritiqueState, CritiquedGradeKey, GradeKey, ReviewKey,
    WorkKey,
};

/// Unix timestamp in seconds.
pub type Timestamp = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub identicon: String,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: String,
    pub title: String,
    pub work_url: String,
    pub blurb: String,
    pub submission_open: Timestamp,
    pub submission_close: Timestamp,
    pub reviews_open: Timestamp,
    pub reviews_close: Timestamp,
    pub critiques_open: Timestamp,
    pub critiques_close: Timestamp,
    pub results_publish: Timestamp,
    pub min_reviews: u32,
    pub min_critiques: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub assignment_id: String,
    pub worker_id: String,
    #[serde(default)]
    pub local_url: Option<String>,
    #[serde(default)]
    pub submission_time: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingCategory {
    pub assignment_id: String,
    pub category_id: String,
    pub title: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkingCriteria {
    pub assignment_id: String,
    pub category_id: String,
    pub criteria_id: String,
    pub weight: f64,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub assignment_id: String,
    pub worker_id: String,
    pub reviewer_id: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub submission_time: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub assignment_id: String,
    pub worker_id: String,
    pub reviewer_id: String,
    pub criteria_id: String,
    #[serde(default)]
    pub mark: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critique {
    pub assignment_id: String,
    pub worker_id: String,
    pub reviewer_id: String,
    pub critic_id: String,
    #[serde(default)]
    pub submission_time: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiquedGrade {
    pub assignment_id: String,
    pub worker_id: String,
    pub reviewer_id: String,
    pub critic_id: String,
    pub criteria_id: String,
    #[serde(default)]
    pub proposed_mark: Option<f64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub state: CritiqueState,
}

/// An issued API token. Only the Argon2id hash of the secret is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub token_hash: String,
    pub token_lookup: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Work {
    #[must_use]
    pub fn key(&self) -> WorkKey {
        WorkKey::new(&self.assignment_id, &self.worker_id)
    }
}

impl MarkingCategory {
    #[must_use]
    pub fn key(&self) -> CategoryKey {
        CategoryKey::new(&self.assignment_id, &self.category_id)
    }
}

impl MarkingCriteria {
    #[must_use]
    pub fn key(&self) -> CriteriaKey {
        CriteriaKey {
            assignment_id: self.assignment_id.clone(),
            category_id: self.category_id.clone(),
            criteria_id: self.criteria_id.clone(),
        }
    }
}

impl Review {
    #[must_use]
    pub fn key(&self) -> ReviewKey {
        ReviewKey::new(&self.assignment_id, &self.worker_id, &self.reviewer_id)
    }

    /// A fresh draft review row for `key`.
    #[must_use]
    pub fn draft(key: &ReviewKey) -> Self {
        Self {
            assignment_id: key.assignment_id.clone(),
            worker_id: key.worker_id.clone(),
            reviewer_id: key.reviewer_id.clone(),
            comment: None,
            submission_time: None,
        }
    }
}

impl Grade {
    #[must_use]
    pub fn review_key(&self) -> ReviewKey {
        ReviewKey::new(&self.assignment_id, &self.worker_id, &self.reviewer_id)
    }

    #[must_use]
    pub fn key(&self) -> GradeKey {
        self.review_key().grade(&self.criteria_id)
    }
}

impl Critique {
    #[must_use]
    pub fn review_key(&self) -> ReviewKey {
        ReviewKey::new(&self.assignment_id, &self.worker_id, &self.reviewer_id)
    }

    #[must_use]
    pub fn key(&self) -> CritiqueKey {
        self.review_key().critique(&self.critic_id)
    }

    #[must_use]
    pub fn draft(key: &CritiqueKey) -> Self {
        Self {
            assignment_id: key.review.assignment_id.clone(),
            worker_id: key.review.worker_id.clone(),
            reviewer_id: key.review.reviewer_id.clone(),
            critic_id: key.critic_id.clone(),
            submission_time: None,
        }
    }
}

impl CritiquedGrade {
    #[must_use]
    pub fn critique_key(&self) -> CritiqueKey {
        ReviewKey::new(&self.assignment_id, &self.worker_id, &self.reviewer_id)
            .critique(&self.critic_id)
    }

    #[must_use]
    pub fn key(&self) -> CritiquedGradeKey {
        self.critique_key().critiqued_grade(&self.criteria_id)
    }
}
