//! # Peermark
//!
//! A peer-review server: students review each other's work against a
//! weighted rubric, critique those reviews, and receive aggregated marks.
//! Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! peermark = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use peermark::auth::StoreTokenVerifier;
//! use peermark::config::TimingConfig;
//! use peermark::engine::Engine;
//! use peermark::server::{AppState, Clock, create_router};
//! use peermark::store::{MemoryStore, Store};
//!
//! let store: Arc<dyn Store> = Arc::new(MemoryStore::open("./data/store.json").unwrap());
//! let state = Arc::new(AppState {
//!     engine: Engine::new(Arc::clone(&store), TimingConfig::default()),
//!     verifier: Arc::new(StoreTokenVerifier::new(store).unwrap()),
//!     clock: Clock::System,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod marks;
pub mod mutation;
pub mod relations;
pub mod server;
pub mod store;
pub mod temporal;
pub mod types;
pub mod visibility;

#[cfg(test)]
mod testing;
