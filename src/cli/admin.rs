use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::TokenGenerator;
use crate::config::ServerConfig;
use crate::error::Error;
use crate::relations::Graph;
use crate::store::{MemoryStore, Store, load_tables};
use crate::types::Token;

const MAX_LOOKUP_ATTEMPTS: usize = 3;

fn store_path(data_dir: String) -> PathBuf {
    ServerConfig {
        data_dir: data_dir.into(),
        ..ServerConfig::default()
    }
    .store_path()
}

/// Issues a token, persists its hash and returns the raw token.
pub fn issue_token(
    store: &dyn Store,
    email: &str,
    is_admin: bool,
    expires_in_seconds: Option<i64>,
) -> anyhow::Result<String> {
    let user = store
        .find_user_by_email(email)?
        .with_context(|| format!("no user with email {email}"))?;

    let expires_at = match expires_in_seconds {
        Some(secs) if secs <= 0 => bail!("--expires-in-seconds must be positive"),
        Some(secs) => Some(Utc::now() + Duration::seconds(secs)),
        None => None,
    };

    let generator = TokenGenerator::new()?;
    for _ in 0..MAX_LOOKUP_ATTEMPTS {
        let (raw_token, lookup, hash) = generator.generate()?;
        let token = Token {
            id: Uuid::new_v4().to_string(),
            token_hash: hash,
            token_lookup: lookup,
            email: user.email.clone(),
            is_admin,
            created_at: Utc::now(),
            expires_at,
        };

        match store.create_token(&token) {
            Ok(()) => return Ok(raw_token),
            Err(Error::TokenLookupCollision) => {
                tracing::warn!("Token lookup collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    bail!("could not generate a unique token lookup after {MAX_LOOKUP_ATTEMPTS} attempts")
}

pub fn run_admin_token(
    data_dir: String,
    email: String,
    admin: bool,
    expires_in_seconds: Option<i64>,
) -> anyhow::Result<()> {
    let path = store_path(data_dir);
    if !path.exists() {
        bail!("Store not found at {}", path.display());
    }

    let store = MemoryStore::open(&path)?;
    let raw_token = issue_token(&store, &email, admin, expires_in_seconds)?;
    store.save(&path)?;

    println!();
    println!("========================================");
    println!("Token for {email} (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("========================================");
    println!();

    Ok(())
}

pub fn run_admin_check(data_dir: String) -> anyhow::Result<()> {
    let path = store_path(data_dir);
    if !path.exists() {
        bail!("Store not found at {}", path.display());
    }

    let tables = load_tables(&path)?;
    Graph::build(&tables)?;

    println!(
        "OK: {} users, {} assignments, {} works, {} reviews, {} grades, {} critiques, {} critiqued grades",
        tables.users.len(),
        tables.assignments.len(),
        tables.works.len(),
        tables.reviews.len(),
        tables.grades.len(),
        tables.critiques.len(),
        tables.critiqued_grades.len(),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Tables;
    use crate::types::User;

    fn store_with_user() -> MemoryStore {
        let mut tables = Tables::default();
        tables.users.insert(User {
            user_id: "u1".into(),
            email: "Ada@Example.com".into(),
            display_name: "Ada".into(),
            identicon: "i".into(),
            is_admin: false,
        });
        MemoryStore::new(tables)
    }

    #[test]
    fn test_issue_token_for_known_user() {
        let store = store_with_user();
        let raw = issue_token(&store, "ada@example.com", true, Some(60)).unwrap();

        let (lookup, _) = crate::auth::parse_token(&raw).unwrap();
        let token = store.get_token_by_lookup(&lookup).unwrap().unwrap();
        assert_eq!(token.email, "Ada@Example.com");
        assert!(token.is_admin);
        assert!(token.expires_at.is_some());
    }

    #[test]
    fn test_issue_token_rejects_unknown_user_and_bad_expiry() {
        let store = store_with_user();
        assert!(issue_token(&store, "nobody@example.com", false, None).is_err());
        assert!(issue_token(&store, "ada@example.com", false, Some(0)).is_err());
    }
}
