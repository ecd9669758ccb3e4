//! Shared unit-test data.

pub mod fixture {
    use crate::store::Tables;
    use crate::types::*;
    use crate::visibility::Caller;

    pub const ASSIGNMENT: &str = "essay-1";

    pub const SUBMISSION_OPEN: Timestamp = 1_000;
    pub const SUBMISSION_CLOSE: Timestamp = 2_000;
    pub const REVIEWS_OPEN: Timestamp = 2_000;
    pub const REVIEWS_CLOSE: Timestamp = 3_000;
    pub const CRITIQUES_OPEN: Timestamp = 3_000;
    pub const CRITIQUES_CLOSE: Timestamp = 4_000;
    pub const RESULTS_PUBLISH: Timestamp = 5_000;

    pub fn review_key(worker: &str, reviewer: &str) -> ReviewKey {
        ReviewKey::new(ASSIGNMENT, worker, reviewer)
    }

    pub fn caller(user_id: &str) -> Caller {
        Caller {
            user_id: user_id.to_string(),
            is_admin: false,
        }
    }

    pub fn admin() -> Caller {
        Caller {
            user_id: "admin".to_string(),
            is_admin: true,
        }
    }

    fn user(id: &str, is_admin: bool) -> User {
        User {
            user_id: id.to_string(),
            email: format!("{id}@example.com"),
            display_name: format!("{}{}", id[..1].to_uppercase(), &id[1..]),
            identicon: format!("identicon-{id}"),
            is_admin,
        }
    }

    fn grade(worker: &str, reviewer: &str, criteria: &str, mark: f64, comment: &str) -> Grade {
        Grade {
            assignment_id: ASSIGNMENT.into(),
            worker_id: worker.into(),
            reviewer_id: reviewer.into(),
            criteria_id: criteria.into(),
            mark: Some(mark),
            comment: Some(comment.into()),
        }
    }

    fn critiqued(
        critic: &str,
        criteria: &str,
        proposed: f64,
        state: CritiqueState,
        comment: &str,
    ) -> CritiquedGrade {
        CritiquedGrade {
            assignment_id: ASSIGNMENT.into(),
            worker_id: "wendy".into(),
            reviewer_id: "rita".into(),
            critic_id: critic.into(),
            criteria_id: criteria.into(),
            proposed_mark: Some(proposed),
            comment: Some(comment.into()),
            state,
        }
    }

    fn criteria(category: &str, id: &str, weight: f64) -> MarkingCriteria {
        MarkingCriteria {
            assignment_id: ASSIGNMENT.into(),
            category_id: category.into(),
            criteria_id: id.into(),
            weight,
            subtitle: format!("{id} subtitle"),
            description: format!("How well the essay handles {id}"),
        }
    }

    /// One assignment with a two-category rubric:
    ///
    /// - writing (weight 1): clarity (1), structure (3)
    /// - content (weight 2): accuracy (1)
    ///
    /// wendy's work has a submitted, complete review by rita (critiqued by
    /// carl, submitted and complete, and cara, a draft) and a draft review by
    /// rob with marks but no overall comment. wendy's own review of rita is
    /// an empty draft.
    pub fn tables() -> Tables {
        let mut tables = Tables::default();

        for id in ["wendy", "rita", "rob", "carl", "cara"] {
            tables.users.insert(user(id, false));
        }
        tables.users.insert(user("admin", true));

        tables.assignments.insert(Assignment {
            assignment_id: ASSIGNMENT.into(),
            title: "Persuasive essay".into(),
            work_url: "/works/essay-1".into(),
            blurb: "Argue for or against".into(),
            submission_open: SUBMISSION_OPEN,
            submission_close: SUBMISSION_CLOSE,
            reviews_open: REVIEWS_OPEN,
            reviews_close: REVIEWS_CLOSE,
            critiques_open: CRITIQUES_OPEN,
            critiques_close: CRITIQUES_CLOSE,
            results_publish: RESULTS_PUBLISH,
            min_reviews: 2,
            min_critiques: 1,
        });

        for worker in ["wendy", "rita", "rob"] {
            tables.works.insert(Work {
                assignment_id: ASSIGNMENT.into(),
                worker_id: worker.into(),
                local_url: Some(format!("/uploads/{worker}.zip")),
                submission_time: Some(SUBMISSION_CLOSE - 10),
            });
        }

        tables.categories.insert(MarkingCategory {
            assignment_id: ASSIGNMENT.into(),
            category_id: "writing".into(),
            title: "Writing".into(),
            weight: 1.0,
        });
        tables.categories.insert(MarkingCategory {
            assignment_id: ASSIGNMENT.into(),
            category_id: "content".into(),
            title: "Content".into(),
            weight: 2.0,
        });
        tables.criteria.insert(criteria("writing", "clarity", 1.0));
        tables.criteria.insert(criteria("writing", "structure", 3.0));
        tables.criteria.insert(criteria("content", "accuracy", 1.0));

        tables.reviews.insert(Review {
            assignment_id: ASSIGNMENT.into(),
            worker_id: "wendy".into(),
            reviewer_id: "rita".into(),
            comment: Some("Good work".into()),
            submission_time: Some(REVIEWS_CLOSE - 500),
        });
        tables.reviews.insert(Review {
            assignment_id: ASSIGNMENT.into(),
            worker_id: "wendy".into(),
            reviewer_id: "rob".into(),
            comment: None,
            submission_time: None,
        });
        tables.reviews.insert(Review::draft(&review_key("rita", "wendy")));

        tables.grades.insert(grade("wendy", "rita", "clarity", 0.8, "clear"));
        tables.grades.insert(grade("wendy", "rita", "structure", 0.6, "ok"));
        tables.grades.insert(grade("wendy", "rita", "accuracy", 1.0, "correct"));
        tables.grades.insert(grade("wendy", "rob", "clarity", 0.4, "vague"));
        tables.grades.insert(grade("wendy", "rob", "structure", 0.6, "fine"));
        tables.grades.insert(grade("wendy", "rob", "accuracy", 0.5, "half right"));

        let rita_review = review_key("wendy", "rita");
        tables.critiques.insert(Critique {
            submission_time: Some(CRITIQUES_CLOSE - 500),
            ..Critique::draft(&rita_review.critique("carl"))
        });
        tables
            .critiques
            .insert(Critique::draft(&rita_review.critique("cara")));

        tables.critiqued_grades.insert(critiqued(
            "carl",
            "clarity",
            0.9,
            CritiqueState::Accepted,
            "too low",
        ));
        tables.critiqued_grades.insert(critiqued(
            "carl",
            "structure",
            0.6,
            CritiqueState::Agreeing,
            "agree",
        ));
        tables.critiqued_grades.insert(critiqued(
            "carl",
            "accuracy",
            1.0,
            CritiqueState::Agreeing,
            "agree",
        ));
        tables.critiqued_grades.insert(critiqued(
            "cara",
            "clarity",
            0.2,
            CritiqueState::Submitted,
            "too high",
        ));

        tables
    }
}
