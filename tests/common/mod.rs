#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use peermark::auth::{Identity, TokenVerifier};
use peermark::config::TimingConfig;
use peermark::engine::Engine;
use peermark::error::Result;
use peermark::server::{AppState, Clock, create_router};
use peermark::store::{MemoryStore, Store, Tables};

pub const ASSIGNMENT: &str = "essay-1";

pub const REVIEWS_OPEN: i64 = 2_000;
pub const REVIEWS_CLOSE: i64 = 3_000;
pub const CRITIQUES_OPEN: i64 = 3_000;
pub const CRITIQUES_CLOSE: i64 = 4_000;
pub const RESULTS_PUBLISH: i64 = 5_000;

fn user(id: &str) -> Value {
    json!({
        "user_id": id,
        "email": format!("{id}@example.com"),
        "display_name": id.to_uppercase(),
        "identicon": format!("identicon-{id}"),
    })
}

fn grade(worker: &str, reviewer: &str, criteria: &str, mark: f64) -> Value {
    json!({
        "assignment_id": ASSIGNMENT,
        "worker_id": worker,
        "reviewer_id": reviewer,
        "criteria_id": criteria,
        "mark": mark,
        "comment": format!("{criteria} comment"),
    })
}

fn critiqued(critic: &str, criteria: &str, proposed: f64, state: u8) -> Value {
    json!({
        "assignment_id": ASSIGNMENT,
        "worker_id": "wendy",
        "reviewer_id": "rita",
        "critic_id": critic,
        "criteria_id": criteria,
        "proposed_mark": proposed,
        "comment": "see rubric",
        "state": state,
    })
}

/// The store.json seed shared by the API and CLI tests.
///
/// wendy's work has a submitted review by rita and a blank draft by rob.
/// carl has submitted a critique of rita's review with one pending
/// proposal; cara's critique is still a draft.
pub fn seed() -> Value {
    let mut admin = user("admin");
    admin["is_admin"] = json!(true);

    json!({
        "users": [user("wendy"), user("rita"), user("rob"), user("carl"), user("cara"), admin],
        "assignments": [{
            "assignment_id": ASSIGNMENT,
            "title": "Persuasive essay",
            "work_url": "/works/essay-1",
            "blurb": "Argue for or against",
            "submission_open": 1_000,
            "submission_close": 2_000,
            "reviews_open": REVIEWS_OPEN,
            "reviews_close": REVIEWS_CLOSE,
            "critiques_open": CRITIQUES_OPEN,
            "critiques_close": CRITIQUES_CLOSE,
            "results_publish": RESULTS_PUBLISH,
            "min_reviews": 2,
            "min_critiques": 1,
        }],
        "works": (["wendy", "rita", "rob"].iter().map(|w| json!({
            "assignment_id": ASSIGNMENT,
            "worker_id": w,
            "local_url": format!("/uploads/{w}.zip"),
            "submission_time": 1_990,
        })).collect::<Vec<_>>()),
        "categories": [
            {"assignment_id": ASSIGNMENT, "category_id": "writing", "title": "Writing", "weight": 1.0},
            {"assignment_id": ASSIGNMENT, "category_id": "content", "title": "Content", "weight": 2.0},
        ],
        "criteria": [
            {"assignment_id": ASSIGNMENT, "category_id": "writing", "criteria_id": "clarity", "weight": 1.0},
            {"assignment_id": ASSIGNMENT, "category_id": "writing", "criteria_id": "structure", "weight": 3.0},
            {"assignment_id": ASSIGNMENT, "category_id": "content", "criteria_id": "accuracy", "weight": 1.0},
        ],
        "reviews": [
            {"assignment_id": ASSIGNMENT, "worker_id": "wendy", "reviewer_id": "rita",
             "comment": "Good work", "submission_time": 2_500},
            {"assignment_id": ASSIGNMENT, "worker_id": "wendy", "reviewer_id": "rob"},
            {"assignment_id": ASSIGNMENT, "worker_id": "rita", "reviewer_id": "wendy"},
        ],
        "grades": [
            grade("wendy", "rita", "clarity", 0.8),
            grade("wendy", "rita", "structure", 0.6),
            grade("wendy", "rita", "accuracy", 1.0),
        ],
        "critiques": [
            {"assignment_id": ASSIGNMENT, "worker_id": "wendy", "reviewer_id": "rita",
             "critic_id": "carl", "submission_time": 3_500},
            {"assignment_id": ASSIGNMENT, "worker_id": "wendy", "reviewer_id": "rita",
             "critic_id": "cara"},
        ],
        "critiqued_grades": [
            critiqued("carl", "clarity", 0.9, 1),
            critiqued("carl", "structure", 0.6, 0),
            critiqued("carl", "accuracy", 1.0, 0),
            critiqued("cara", "clarity", 0.2, 1),
        ],
    })
}

pub fn tables() -> Tables {
    serde_json::from_value(seed()).expect("seed deserializes")
}

pub fn write_seed(data_dir: &Path, seed: &Value) {
    std::fs::write(
        data_dir.join("store.json"),
        serde_json::to_string_pretty(seed).expect("serialize seed"),
    )
    .expect("write seed");
}

/// Accepts `token-<user>` for every seeded user, plus `token-ghost` for an
/// email no user has.
pub struct StaticVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticVerifier {
    pub fn new() -> Self {
        let mut tokens = HashMap::new();
        for id in ["wendy", "rita", "rob", "carl", "cara", "admin", "ghost"] {
            tokens.insert(
                format!("token-{id}"),
                Identity {
                    email: format!("{id}@example.com"),
                    is_admin: false,
                },
            );
        }
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, raw_token: &str) -> Result<Option<Identity>> {
        Ok(self.tokens.get(raw_token).cloned())
    }
}

/// One store shared by routers pinned at different instants.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::from_seed(seed())
    }

    pub fn from_seed(seed: Value) -> Self {
        let tables: Tables = serde_json::from_value(seed).expect("seed deserializes");
        Self {
            store: Arc::new(MemoryStore::new(tables)),
        }
    }

    pub fn at(&self, now: i64) -> Router {
        let store: Arc<dyn Store> = self.store.clone();
        create_router(Arc::new(AppState {
            engine: Engine::new(store, TimingConfig::default()),
            verifier: Arc::new(StaticVerifier::new()),
            clock: Clock::Fixed(now),
        }))
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        request = request.header(header::AUTHORIZATION, format!("Bearer token-{user}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("build request");

    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get(app: &Router, uri: &str, user: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, Some(user), None).await
}
