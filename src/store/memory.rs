use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{Snapshot, Store, Tables, load_tables, save_tables};
use crate::error::{Error, Result};
use crate::types::*;

/// Process-wide in-memory entity store.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    version: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new(tables: Tables) -> Self {
        Self {
            tables: Mutex::new(tables),
            version: AtomicU64::new(0),
        }
    }

    /// Loads the JSON seed at `path` into a fresh store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let tables = load_tables(path.as_ref())?;
        Ok(Self::new(tables))
    }

    /// Writes the current tables back to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let tables = self.tables().clone();
        save_tables(path.as_ref(), &tables)
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `write` under the table lock and bumps the version afterwards.
    /// The version is bumped before the guard drops so no reader can pair
    /// new rows with an old version.
    fn write<T, F>(&self, write: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> Result<T>,
    {
        let mut tables = self.tables();
        let out = write(&mut tables)?;
        self.version.fetch_add(1, Ordering::SeqCst);
        drop(tables);
        Ok(out)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Tables::default())
    }
}

impl Store for MemoryStore {
    fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let tables = self.tables();
        Ok(Snapshot {
            version: self.version.load(Ordering::SeqCst),
            tables: tables.clone(),
        })
    }

    // User operations

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .tables()
            .users
            .find_one(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        self.write(|tables| {
            if tables
                .tokens
                .find_one(|t| t.token_lookup == token.token_lookup)
                .is_some()
            {
                return Err(Error::TokenLookupCollision);
            }
            tables.tokens.insert(token.clone());
            Ok(())
        })
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        Ok(self
            .tables()
            .tokens
            .find_one(|t| t.token_lookup == lookup)
            .cloned())
    }

    // Review operations

    fn get_review(&self, key: &ReviewKey) -> Result<Option<Review>> {
        Ok(self
            .tables()
            .reviews
            .find_one(|r| r.key() == *key)
            .cloned())
    }

    fn get_critique(&self, key: &CritiqueKey) -> Result<Option<Critique>> {
        Ok(self
            .tables()
            .critiques
            .find_one(|c| c.key() == *key)
            .cloned())
    }

    fn apply_review_patch(&self, review: &Review, grades: &[Grade]) -> Result<()> {
        let review_key = review.key();
        self.write(|tables| {
            tables
                .reviews
                .upsert(|r| r.key() == review_key, review.clone());
            for grade in grades {
                let key = grade.key();
                tables.grades.upsert(|g| g.key() == key, grade.clone());
            }
            Ok(())
        })
    }

    fn apply_critique_patch(
        &self,
        critique: &Critique,
        critiqued_grades: &[CritiquedGrade],
    ) -> Result<()> {
        let critique_key = critique.key();
        self.write(|tables| {
            tables
                .critiques
                .upsert(|c| c.key() == critique_key, critique.clone());
            for critiqued in critiqued_grades {
                let key = critiqued.key();
                tables
                    .critiqued_grades
                    .upsert(|cg| cg.key() == key, critiqued.clone());
            }
            Ok(())
        })
    }

    fn apply_critique_responses(&self, critiqued_grades: &[CritiquedGrade]) -> Result<()> {
        self.write(|tables| {
            for critiqued in critiqued_grades {
                let key = critiqued.key();
                if tables.critiqued_grades.find_one(|cg| cg.key() == key).is_none() {
                    return Err(Error::not_found(format!("critiqued grade {key}")));
                }
            }
            for critiqued in critiqued_grades {
                let key = critiqued.key();
                let state = critiqued.state;
                tables
                    .critiqued_grades
                    .update(|cg| cg.key() == key, |cg| cg.state = state);
            }
            Ok(())
        })
    }
}
