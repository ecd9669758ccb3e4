use crate::types::*;

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedCategory {
    pub category: MarkingCategory,
    pub criteria: Vec<MarkingCriteria>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedAssignment {
    pub assignment: Assignment,
    pub works: Vec<Work>,
    pub categories: Vec<JoinedCategory>,
}

/// A critique with its critic and proposals.
///
/// `auto_submitted`, `is_complete` and the proposal states are only
/// meaningful once the tree went through [`super::ReadView`].
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedCritique {
    pub critique: Critique,
    pub critic: User,
    pub critiqued_grades: Vec<CritiquedGrade>,
    pub auto_submitted: bool,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedReview {
    pub review: Review,
    pub work: Work,
    pub reviewer: User,
    pub grades: Vec<Grade>,
    pub critiques: Vec<JoinedCritique>,
    pub auto_submitted: bool,
    pub is_complete: bool,
}

impl JoinedCategory {
    pub fn criteria_ids(&self) -> impl Iterator<Item = &str> {
        self.criteria.iter().map(|c| c.criteria_id.as_str())
    }
}

impl JoinedAssignment {
    /// Every `(category_id, criteria_id)` pair of the rubric.
    pub fn rubric_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().flat_map(|cat| {
            cat.criteria
                .iter()
                .map(|c| (c.category_id.as_str(), c.criteria_id.as_str()))
        })
    }

    #[must_use]
    pub fn criteria_count(&self) -> usize {
        self.categories.iter().map(|c| c.criteria.len()).sum()
    }

    #[must_use]
    pub fn work_of(&self, worker_id: &str) -> Option<&Work> {
        self.works.iter().find(|w| w.worker_id == worker_id)
    }
}

impl JoinedReview {
    #[must_use]
    pub fn key(&self) -> ReviewKey {
        self.review.key()
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.review.submission_time.is_some()
    }

    #[must_use]
    pub fn grade_for(&self, criteria_id: &str) -> Option<&Grade> {
        self.grades.iter().find(|g| g.criteria_id == criteria_id)
    }

    #[must_use]
    pub fn critique_by(&self, critic_id: &str) -> Option<&JoinedCritique> {
        self.critiques
            .iter()
            .find(|c| c.critique.critic_id == critic_id)
    }
}

impl JoinedCritique {
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.critique.submission_time.is_some()
    }

    #[must_use]
    pub fn critiqued_grade_for(&self, criteria_id: &str) -> Option<&CritiquedGrade> {
        self.critiqued_grades
            .iter()
            .find(|cg| cg.criteria_id == criteria_id)
    }
}
