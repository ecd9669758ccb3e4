//! Completeness predicates and weighted mark rollups.
//!
//! Displayed percentages round half away from zero (`f64::round`), so a
//! mark of 0.865 shows as 87 and 0.125 as 13.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::relations::{JoinedAssignment, JoinedCategory, JoinedCritique, JoinedReview};
use crate::types::{CritiquedGrade, Grade};

fn has_text(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.is_empty())
}

// Completeness

/// A criteria is complete when its grade has a mark and a non-empty comment.
#[must_use]
pub fn grade_is_complete(grade: Option<&Grade>) -> bool {
    grade.is_some_and(|g| g.mark.is_some() && has_text(g.comment.as_deref()))
}

#[must_use]
pub fn category_is_complete(category: &JoinedCategory, grades: &[Grade]) -> bool {
    category.criteria_ids().all(|criteria_id| {
        grade_is_complete(grades.iter().find(|g| g.criteria_id == criteria_id))
    })
}

#[must_use]
pub fn review_is_complete(
    comment: Option<&str>,
    categories: &[JoinedCategory],
    grades: &[Grade],
) -> bool {
    has_text(comment) && categories.iter().all(|c| category_is_complete(c, grades))
}

#[must_use]
pub fn critiqued_grade_is_complete(critiqued: Option<&CritiquedGrade>) -> bool {
    critiqued.is_some_and(|cg| has_text(cg.comment.as_deref()) && cg.proposed_mark.is_some())
}

/// Every criteria that has a grade needs a complete proposal; ungraded
/// criteria are vacuously complete.
#[must_use]
pub fn critique_is_complete(
    categories: &[JoinedCategory],
    grades: &[Grade],
    critiqued_grades: &[CritiquedGrade],
) -> bool {
    categories
        .iter()
        .flat_map(JoinedCategory::criteria_ids)
        .filter(|criteria_id| grades.iter().any(|g| g.criteria_id == *criteria_id))
        .all(|criteria_id| {
            critiqued_grade_is_complete(
                critiqued_grades
                    .iter()
                    .find(|cg| cg.criteria_id == criteria_id),
            )
        })
}

// Arithmetic

/// The original mark counts once, plus one vote per critique: accepted
/// proposals vote their proposed mark, everything else votes the original.
#[must_use]
pub fn adjusted_mark(original: f64, proposals: &[&CritiquedGrade]) -> f64 {
    let votes: f64 = proposals
        .iter()
        .map(|cg| {
            if cg.state.replaces_mark() {
                cg.proposed_mark.unwrap_or(original)
            } else {
                original
            }
        })
        .sum();
    (original + votes) / (proposals.len() as f64 + 1.0)
}

/// Mean of the per-review adjusted marks; zero when nobody graded.
#[must_use]
pub fn criteria_mark(adjusted: &[f64]) -> f64 {
    if adjusted.is_empty() {
        return 0.0;
    }
    adjusted.iter().sum::<f64>() / adjusted.len() as f64
}

/// `Σ weight·mark / Σ weight`. Negative, non-finite or all-zero weights are
/// a rubric configuration error, never silently coerced.
pub fn weighted_mean<I>(items: I, what: &str) -> Result<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut total_weight = 0.0;
    let mut total = 0.0;

    for (weight, mark) in items {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::Aggregation(format!(
                "{what} has invalid weight {weight}"
            )));
        }
        total_weight += weight;
        total += weight * mark;
    }

    if total_weight <= 0.0 {
        return Err(Error::Aggregation(format!("{what} has zero total weight")));
    }

    Ok(total / total_weight)
}

/// Rewards completing the quota but never more than it.
#[must_use]
pub fn participation_mark(completed: usize, quota: u32) -> f64 {
    if quota == 0 {
        return 1.0;
    }
    completed.min(quota as usize) as f64 / f64::from(quota)
}

#[must_use]
pub fn percent(mark: f64) -> i64 {
    (mark * 100.0).round() as i64
}

// Reports

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mark {
    pub value: f64,
    pub percent: i64,
}

impl Mark {
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value,
            percent: percent(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriteriaMarks {
    pub criteria_id: String,
    pub weight: f64,
    pub grade_count: usize,
    pub mark: Mark,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMarks {
    pub category_id: String,
    pub title: String,
    pub weight: f64,
    pub mark: Mark,
    pub criteria: Vec<CriteriaMarks>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkMarks {
    pub assignment_id: String,
    pub worker_id: String,
    pub main: Mark,
    pub categories: Vec<CategoryMarks>,
    pub reviews_completed: usize,
    pub review_participation: Mark,
    pub critiques_completed: usize,
    pub critique_participation: Mark,
}

/// Inputs for one worker's marks, all resolved at the same instant.
pub struct MarkInputs<'a> {
    pub rubric: &'a JoinedAssignment,
    pub worker_id: &'a str,
    /// Reviews of the worker's work.
    pub received: &'a [JoinedReview],
    /// Reviews the worker wrote.
    pub authored: &'a [JoinedReview],
    /// Reviews carrying a critique by the worker.
    pub critiqued: &'a [JoinedReview],
}

fn submitted_proposals<'r>(review: &'r JoinedReview, criteria_id: &str) -> Vec<&'r CritiquedGrade> {
    review
        .critiques
        .iter()
        .filter(|c| c.is_submitted())
        .filter_map(|c| c.critiqued_grade_for(criteria_id))
        .collect()
}

fn criteria_marks(inputs: &MarkInputs<'_>, criteria_id: &str, weight: f64) -> CriteriaMarks {
    let adjusted: Vec<f64> = inputs
        .received
        .iter()
        .filter_map(|review| {
            let original = review.grade_for(criteria_id)?.mark?;
            Some(adjusted_mark(original, &submitted_proposals(review, criteria_id)))
        })
        .collect();

    CriteriaMarks {
        criteria_id: criteria_id.to_string(),
        weight,
        grade_count: adjusted.len(),
        mark: Mark::new(criteria_mark(&adjusted)),
    }
}

/// Bottom-up rollup: criteria, categories, then the main mark, plus the
/// review and critique participation marks.
pub fn work_marks(inputs: &MarkInputs<'_>) -> Result<WorkMarks> {
    let assignment = &inputs.rubric.assignment;

    let mut categories = Vec::with_capacity(inputs.rubric.categories.len());
    for joined in &inputs.rubric.categories {
        let criteria: Vec<CriteriaMarks> = joined
            .criteria
            .iter()
            .map(|c| criteria_marks(inputs, &c.criteria_id, c.weight))
            .collect();

        let value = weighted_mean(
            criteria.iter().map(|c| (c.weight, c.mark.value)),
            &format!("category {}", joined.category.key()),
        )?;

        categories.push(CategoryMarks {
            category_id: joined.category.category_id.clone(),
            title: joined.category.title.clone(),
            weight: joined.category.weight,
            mark: Mark::new(value),
            criteria,
        });
    }

    let main = weighted_mean(
        categories.iter().map(|c| (c.weight, c.mark.value)),
        &format!("assignment {}", assignment.assignment_id),
    )?;

    let reviews_completed = inputs
        .authored
        .iter()
        .filter(|r| {
            r.review.assignment_id == assignment.assignment_id
                && r.review.reviewer_id == inputs.worker_id
                && r.is_complete
        })
        .count();

    let critiques_completed = inputs
        .critiqued
        .iter()
        .filter(|r| r.review.assignment_id == assignment.assignment_id)
        .filter_map(|r| r.critique_by(inputs.worker_id))
        .filter(|c: &&JoinedCritique| c.is_complete)
        .count();

    Ok(WorkMarks {
        assignment_id: assignment.assignment_id.clone(),
        worker_id: inputs.worker_id.to_string(),
        main: Mark::new(main),
        categories,
        reviews_completed,
        review_participation: Mark::new(participation_mark(
            reviews_completed,
            assignment.min_reviews,
        )),
        critiques_completed,
        critique_participation: Mark::new(participation_mark(
            critiques_completed,
            assignment.min_critiques,
        )),
    })
}
