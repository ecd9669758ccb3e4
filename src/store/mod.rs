mod collection;
mod memory;
mod seed;

pub use collection::Collection;
pub use memory::MemoryStore;
pub use seed::{load_tables, save_tables};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::*;

/// The nine flat entity collections plus issued tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub users: Collection<User>,
    pub assignments: Collection<Assignment>,
    pub works: Collection<Work>,
    pub categories: Collection<MarkingCategory>,
    pub criteria: Collection<MarkingCriteria>,
    pub reviews: Collection<Review>,
    pub grades: Collection<Grade>,
    pub critiques: Collection<Critique>,
    pub critiqued_grades: Collection<CritiquedGrade>,
    pub tokens: Collection<Token>,
}

/// A copy of the tables tagged with the store version it was taken at.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub version: u64,
    pub tables: Tables,
}

/// Store defines the entity store interface.
///
/// Every write bumps the version counter, which readers use to invalidate
/// anything derived from an earlier snapshot.
pub trait Store: Send + Sync {
    fn version(&self) -> u64;

    /// Returns an owned copy of every collection; it never aliases store rows.
    fn snapshot(&self) -> Result<Snapshot>;

    // User operations
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;

    // Review operations
    fn get_review(&self, key: &ReviewKey) -> Result<Option<Review>>;
    fn get_critique(&self, key: &CritiqueKey) -> Result<Option<Critique>>;

    /// Upserts the review row and every grade under one lock acquisition.
    fn apply_review_patch(&self, review: &Review, grades: &[Grade]) -> Result<()>;

    /// Upserts the critique row and every critiqued grade under one lock acquisition.
    fn apply_critique_patch(
        &self,
        critique: &Critique,
        critiqued_grades: &[CritiquedGrade],
    ) -> Result<()>;

    /// Replaces existing critiqued grades (reviewer decisions). Missing rows are an error.
    fn apply_critique_responses(&self, critiqued_grades: &[CritiquedGrade]) -> Result<()>;
}
