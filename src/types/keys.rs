//! Composite keys for the relational entities.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkKey {
    pub assignment_id: String,
    pub worker_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryKey {
    pub assignment_id: String,
    pub category_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CriteriaKey {
    pub assignment_id: String,
    pub category_id: String,
    pub criteria_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewKey {
    pub assignment_id: String,
    pub worker_id: String,
    pub reviewer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GradeKey {
    pub review: ReviewKey,
    pub criteria_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CritiqueKey {
    pub review: ReviewKey,
    pub critic_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CritiquedGradeKey {
    pub critique: CritiqueKey,
    pub criteria_id: String,
}

impl WorkKey {
    pub fn new(assignment_id: impl Into<String>, worker_id: impl Into<String>) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            worker_id: worker_id.into(),
        }
    }
}

impl CategoryKey {
    pub fn new(assignment_id: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            category_id: category_id.into(),
        }
    }
}

impl CriteriaKey {
    #[must_use]
    pub fn category(&self) -> CategoryKey {
        CategoryKey::new(&self.assignment_id, &self.category_id)
    }
}

impl ReviewKey {
    pub fn new(
        assignment_id: impl Into<String>,
        worker_id: impl Into<String>,
        reviewer_id: impl Into<String>,
    ) -> Self {
        Self {
            assignment_id: assignment_id.into(),
            worker_id: worker_id.into(),
            reviewer_id: reviewer_id.into(),
        }
    }

    #[must_use]
    pub fn work(&self) -> WorkKey {
        WorkKey::new(&self.assignment_id, &self.worker_id)
    }

    #[must_use]
    pub fn grade(&self, criteria_id: impl Into<String>) -> GradeKey {
        GradeKey {
            review: self.clone(),
            criteria_id: criteria_id.into(),
        }
    }

    #[must_use]
    pub fn critique(&self, critic_id: impl Into<String>) -> CritiqueKey {
        CritiqueKey {
            review: self.clone(),
            critic_id: critic_id.into(),
        }
    }
}

impl CritiqueKey {
    #[must_use]
    pub fn critiqued_grade(&self, criteria_id: impl Into<String>) -> CritiquedGradeKey {
        CritiquedGradeKey {
            critique: self.clone(),
            criteria_id: criteria_id.into(),
        }
    }
}

impl fmt::Display for WorkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.assignment_id, self.worker_id)
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.assignment_id, self.category_id)
    }
}

impl fmt::Display for CriteriaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.assignment_id, self.category_id, self.criteria_id
        )
    }
}

impl fmt::Display for ReviewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.assignment_id, self.worker_id, self.reviewer_id
        )
    }
}

impl fmt::Display for GradeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.review, self.criteria_id)
    }
}

impl fmt::Display for CritiqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.review, self.critic_id)
    }
}

impl fmt::Display for CritiquedGradeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.critique, self.criteria_id)
    }
}
