use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{TokenGenerator, parse_token};
use crate::error::{Error, Result};
use crate::store::Store;

/// Who a verified token speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub is_admin: bool,
}

/// Opaque token verification. `Ok(None)` means the token is not recognised.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, raw_token: &str) -> Result<Option<Identity>>;
}

/// Checks tokens against the hashes kept in the store.
pub struct StoreTokenVerifier {
    store: Arc<dyn Store>,
    generator: Arc<TokenGenerator>,
}

impl StoreTokenVerifier {
    pub fn new(store: Arc<dyn Store>) -> Result<Self> {
        Ok(Self {
            store,
            generator: Arc::new(TokenGenerator::new()?),
        })
    }
}

fn verify_against_store(
    store: &dyn Store,
    generator: &TokenGenerator,
    raw_token: &str,
) -> Result<Option<Identity>> {
    let (lookup, _secret) = parse_token(raw_token)?;

    let Some(token) = store.get_token_by_lookup(&lookup)? else {
        return Ok(None);
    };
    if !generator.verify(raw_token, &token.token_hash)? {
        return Ok(None);
    }
    if token.expires_at.is_some_and(|expires_at| expires_at < Utc::now()) {
        return Err(Error::TokenExpired);
    }

    Ok(Some(Identity {
        email: token.email,
        is_admin: token.is_admin,
    }))
}

#[async_trait]
impl TokenVerifier for StoreTokenVerifier {
    async fn verify(&self, raw_token: &str) -> Result<Option<Identity>> {
        // Argon2 hashing runs on the blocking pool.
        let store = Arc::clone(&self.store);
        let generator = Arc::clone(&self.generator);
        let raw_token = raw_token.to_string();

        tokio::task::spawn_blocking(move || {
            verify_against_store(store.as_ref(), &generator, &raw_token)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }
}

/// Runs `verifier` with an upper bound; running out of time is a fault,
/// never an anonymous caller.
pub async fn verify_with_timeout(
    verifier: &dyn TokenVerifier,
    raw_token: &str,
    timeout: Duration,
) -> Result<Option<Identity>> {
    match tokio::time::timeout(timeout, verifier.verify(raw_token)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!(
            "token verification exceeded {}ms",
            timeout.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::Token;

    fn issue(store: &MemoryStore, email: &str, expires_in: Option<chrono::Duration>) -> String {
        let generator = TokenGenerator::new().unwrap();
        let (raw, lookup, hash) = generator.generate().unwrap();
        store
            .create_token(&Token {
                id: uuid::Uuid::new_v4().to_string(),
                token_hash: hash,
                token_lookup: lookup,
                email: email.to_string(),
                is_admin: false,
                created_at: Utc::now(),
                expires_at: expires_in.map(|d| Utc::now() + d),
            })
            .unwrap();
        raw
    }

    #[tokio::test]
    async fn test_store_verifier_accepts_issued_token() {
        let store = Arc::new(MemoryStore::default());
        let raw = issue(&store, "wendy@example.com", None);
        let verifier = StoreTokenVerifier::new(store).unwrap();

        let identity = verifier.verify(&raw).await.unwrap().unwrap();
        assert_eq!(identity.email, "wendy@example.com");
        assert!(!identity.is_admin);
    }

    #[tokio::test]
    async fn test_store_verifier_rejects_unknown_and_tampered() {
        let store = Arc::new(MemoryStore::default());
        let raw = issue(&store, "wendy@example.com", None);
        let verifier = StoreTokenVerifier::new(store).unwrap();

        let last = if raw.ends_with('0') { '1' } else { '0' };
        let tampered = format!("{}{last}", &raw[..raw.len() - 1]);
        assert_eq!(verifier.verify(&tampered).await.unwrap(), None);
        assert_eq!(
            verifier
                .verify("peermark_00000000_000000000000000000000000")
                .await
                .unwrap(),
            None
        );
        assert!(matches!(
            verifier.verify("garbage").await,
            Err(Error::InvalidTokenFormat)
        ));
    }

    #[tokio::test]
    async fn test_store_verifier_rejects_expired() {
        let store = Arc::new(MemoryStore::default());
        let raw = issue(&store, "wendy@example.com", Some(chrono::Duration::seconds(-5)));
        let verifier = StoreTokenVerifier::new(store).unwrap();

        assert!(matches!(verifier.verify(&raw).await, Err(Error::TokenExpired)));
    }

    struct SlowVerifier;

    #[async_trait]
    impl TokenVerifier for SlowVerifier {
        async fn verify(&self, _raw_token: &str) -> Result<Option<Identity>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_a_fault() {
        let result = verify_with_timeout(&SlowVerifier, "x", Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
