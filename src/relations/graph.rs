use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::hash::Hash;

use super::tree::{JoinedAssignment, JoinedCategory, JoinedCritique, JoinedReview};
use crate::error::{Error, Result};
use crate::store::Tables;
use crate::types::*;

/// Composite-key indexes over one snapshot of the tables.
///
/// Building checks every foreign key, uniqueness constraint and mark range;
/// once built, every lookup and tree is guaranteed to resolve.
#[derive(Debug, Default)]
pub struct Graph {
    users: HashMap<String, User>,
    assignments: HashMap<String, Assignment>,
    assignment_order: Vec<String>,
    works: HashMap<WorkKey, Work>,
    categories: HashMap<CategoryKey, MarkingCategory>,
    criteria: HashMap<CriteriaKey, MarkingCriteria>,
    criteria_by_id: HashMap<(String, String), CriteriaKey>,
    reviews: HashMap<ReviewKey, Review>,
    review_order: Vec<ReviewKey>,
    grades: HashMap<GradeKey, Grade>,
    critiques: HashMap<CritiqueKey, Critique>,
    critiqued_grades: HashMap<CritiquedGradeKey, CritiquedGrade>,

    works_by_assignment: HashMap<String, Vec<WorkKey>>,
    categories_by_assignment: HashMap<String, Vec<CategoryKey>>,
    criteria_by_category: HashMap<CategoryKey, Vec<CriteriaKey>>,
    reviews_by_work: HashMap<WorkKey, Vec<ReviewKey>>,
    grades_by_review: HashMap<ReviewKey, Vec<GradeKey>>,
    critiques_by_review: HashMap<ReviewKey, Vec<CritiqueKey>>,
    critiqued_by_critique: HashMap<CritiqueKey, Vec<CritiquedGradeKey>>,
}

fn inconsistency(message: String) -> Error {
    Error::ReferentialInconsistency(message)
}

fn insert_unique<K, V>(map: &mut HashMap<K, V>, key: K, value: V, what: &str) -> Result<()>
where
    K: Eq + Hash + Display,
{
    match map.entry(key) {
        Entry::Occupied(e) => Err(inconsistency(format!("duplicate {what} {}", e.key()))),
        Entry::Vacant(e) => {
            e.insert(value);
            Ok(())
        }
    }
}

fn require<K, V>(map: &HashMap<K, V>, key: &K, parent: &str, child: &dyn Display) -> Result<()>
where
    K: Eq + Hash + Display,
{
    if map.contains_key(key) {
        Ok(())
    } else {
        Err(inconsistency(format!(
            "{child} references missing {parent} {key}"
        )))
    }
}

fn check_mark(mark: Option<f64>, what: &dyn Display) -> Result<()> {
    match mark {
        Some(m) if !(0.0..=1.0).contains(&m) => Err(inconsistency(format!(
            "{what} carries mark {m} outside [0, 1]"
        ))),
        _ => Ok(()),
    }
}

impl Graph {
    /// One pass over every collection. Any dangling reference aborts the build.
    pub fn build(tables: &Tables) -> Result<Self> {
        let mut graph = Graph::default();

        for user in &tables.users {
            insert_unique(&mut graph.users, user.user_id.clone(), user.clone(), "user")?;
        }

        for assignment in &tables.assignments {
            let id = assignment.assignment_id.clone();
            insert_unique(&mut graph.assignments, id.clone(), assignment.clone(), "assignment")?;
            graph.assignment_order.push(id);
        }

        for work in &tables.works {
            let key = work.key();
            require(&graph.assignments, &work.assignment_id, "assignment", &format!("work {key}"))?;
            require(&graph.users, &work.worker_id, "user", &format!("work {key}"))?;
            insert_unique(&mut graph.works, key.clone(), work.clone(), "work")?;
            graph
                .works_by_assignment
                .entry(work.assignment_id.clone())
                .or_default()
                .push(key);
        }

        for category in &tables.categories {
            let key = category.key();
            require(
                &graph.assignments,
                &category.assignment_id,
                "assignment",
                &format!("category {key}"),
            )?;
            insert_unique(&mut graph.categories, key.clone(), category.clone(), "category")?;
            graph
                .categories_by_assignment
                .entry(category.assignment_id.clone())
                .or_default()
                .push(key);
        }

        for criteria in &tables.criteria {
            let key = criteria.key();
            let category_key = key.category();
            require(&graph.categories, &category_key, "category", &format!("criteria {key}"))?;

            let by_id = (criteria.assignment_id.clone(), criteria.criteria_id.clone());
            if let Some(other) = graph.criteria_by_id.get(&by_id) {
                return Err(inconsistency(format!(
                    "criteria id {} is used by both {other} and {key}",
                    criteria.criteria_id
                )));
            }
            insert_unique(&mut graph.criteria, key.clone(), criteria.clone(), "criteria")?;
            graph.criteria_by_id.insert(by_id, key.clone());
            graph
                .criteria_by_category
                .entry(category_key)
                .or_default()
                .push(key);
        }

        for review in &tables.reviews {
            let key = review.key();
            require(&graph.works, &key.work(), "work", &format!("review {key}"))?;
            require(&graph.users, &review.reviewer_id, "user", &format!("review {key}"))?;
            insert_unique(&mut graph.reviews, key.clone(), review.clone(), "review")?;
            graph
                .reviews_by_work
                .entry(key.work())
                .or_default()
                .push(key.clone());
            graph.review_order.push(key);
        }

        for grade in &tables.grades {
            let key = grade.key();
            let what = format!("grade {key}");
            require(&graph.reviews, &grade.review_key(), "review", &what)?;
            if graph.criteria_key(&grade.assignment_id, &grade.criteria_id).is_none() {
                return Err(inconsistency(format!(
                    "{what} references missing criteria {}",
                    grade.criteria_id
                )));
            }
            check_mark(grade.mark, &what)?;
            insert_unique(&mut graph.grades, key.clone(), grade.clone(), "grade")?;
            graph
                .grades_by_review
                .entry(grade.review_key())
                .or_default()
                .push(key);
        }

        for critique in &tables.critiques {
            let key = critique.key();
            require(&graph.reviews, &critique.review_key(), "review", &format!("critique {key}"))?;
            require(&graph.users, &critique.critic_id, "user", &format!("critique {key}"))?;
            insert_unique(&mut graph.critiques, key.clone(), critique.clone(), "critique")?;
            graph
                .critiques_by_review
                .entry(critique.review_key())
                .or_default()
                .push(key);
        }

        for critiqued in &tables.critiqued_grades {
            let key = critiqued.key();
            let what = format!("critiqued grade {key}");
            require(&graph.critiques, &critiqued.critique_key(), "critique", &what)?;
            if graph
                .criteria_key(&critiqued.assignment_id, &critiqued.criteria_id)
                .is_none()
            {
                return Err(inconsistency(format!(
                    "{what} references missing criteria {}",
                    critiqued.criteria_id
                )));
            }
            check_mark(critiqued.proposed_mark, &what)?;
            insert_unique(
                &mut graph.critiqued_grades,
                key.clone(),
                critiqued.clone(),
                "critiqued grade",
            )?;
            graph
                .critiqued_by_critique
                .entry(critiqued.critique_key())
                .or_default()
                .push(key);
        }

        Ok(graph)
    }

    // Lookups

    #[must_use]
    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    #[must_use]
    pub fn assignment(&self, assignment_id: &str) -> Option<&Assignment> {
        self.assignments.get(assignment_id)
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignment_order
            .iter()
            .filter_map(|id| self.assignments.get(id))
    }

    #[must_use]
    pub fn work(&self, key: &WorkKey) -> Option<&Work> {
        self.works.get(key)
    }

    #[must_use]
    pub fn category(&self, key: &CategoryKey) -> Option<&MarkingCategory> {
        self.categories.get(key)
    }

    #[must_use]
    pub fn criteria(&self, key: &CriteriaKey) -> Option<&MarkingCriteria> {
        self.criteria.get(key)
    }

    /// Resolves a criteria by its id, which is unique within an assignment.
    #[must_use]
    pub fn criteria_key(&self, assignment_id: &str, criteria_id: &str) -> Option<&CriteriaKey> {
        self.criteria_by_id
            .get(&(assignment_id.to_string(), criteria_id.to_string()))
    }

    #[must_use]
    pub fn review(&self, key: &ReviewKey) -> Option<&Review> {
        self.reviews.get(key)
    }

    pub fn review_keys(&self) -> impl Iterator<Item = &ReviewKey> {
        self.review_order.iter()
    }

    #[must_use]
    pub fn grade(&self, key: &GradeKey) -> Option<&Grade> {
        self.grades.get(key)
    }

    #[must_use]
    pub fn critique(&self, key: &CritiqueKey) -> Option<&Critique> {
        self.critiques.get(key)
    }

    #[must_use]
    pub fn critiqued_grade(&self, key: &CritiquedGradeKey) -> Option<&CritiquedGrade> {
        self.critiqued_grades.get(key)
    }

    pub fn reviews_of_work(&self, key: &WorkKey) -> impl Iterator<Item = &ReviewKey> {
        self.reviews_by_work.get(key).into_iter().flatten()
    }

    // Trees

    /// The assignment with its works and rubric. Raw: no temporal resolution needed.
    #[must_use]
    pub fn assignment_tree(&self, assignment_id: &str) -> Option<JoinedAssignment> {
        let assignment = self.assignments.get(assignment_id)?;

        let works = self
            .works_by_assignment
            .get(assignment_id)
            .into_iter()
            .flatten()
            .filter_map(|key| self.works.get(key).cloned())
            .collect();

        let categories = self
            .categories_by_assignment
            .get(assignment_id)
            .into_iter()
            .flatten()
            .filter_map(|key| {
                let category = self.categories.get(key)?.clone();
                let criteria = self
                    .criteria_by_category
                    .get(key)
                    .into_iter()
                    .flatten()
                    .filter_map(|ck| self.criteria.get(ck).cloned())
                    .collect();
                Some(JoinedCategory { category, criteria })
            })
            .collect();

        Some(JoinedAssignment {
            assignment: assignment.clone(),
            works,
            categories,
        })
    }

    /// The review with its work, reviewer, grades and critiques, as stored.
    /// Readers should go through [`super::ReadView`] to get resolved state.
    #[must_use]
    pub fn review_tree(&self, key: &ReviewKey) -> Option<JoinedReview> {
        let review = self.reviews.get(key)?;
        let work = self.works.get(&key.work())?;
        let reviewer = self.users.get(&key.reviewer_id)?;

        let grades = self
            .grades_by_review
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|gk| self.grades.get(gk).cloned())
            .collect();

        let critiques = self
            .critiques_by_review
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|ck| self.critique_tree(ck))
            .collect();

        Some(JoinedReview {
            review: review.clone(),
            work: work.clone(),
            reviewer: reviewer.clone(),
            grades,
            critiques,
            auto_submitted: false,
            is_complete: false,
        })
    }

    fn critique_tree(&self, key: &CritiqueKey) -> Option<JoinedCritique> {
        let critique = self.critiques.get(key)?;
        let critic = self.users.get(&key.critic_id)?;

        let critiqued_grades = self
            .critiqued_by_critique
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|cgk| self.critiqued_grades.get(cgk).cloned())
            .collect();

        Some(JoinedCritique {
            critique: critique.clone(),
            critic: critic.clone(),
            critiqued_grades,
            auto_submitted: false,
            is_complete: false,
        })
    }
}
