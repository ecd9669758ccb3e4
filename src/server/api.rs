use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde_json::Value;

use crate::auth::RequireCaller;
use crate::server::AppState;
use crate::server::dto::{AssignmentsParams, MarksParams, ReviewsParams};
use crate::server::response::{ApiError, ApiResponse};

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Assignments
        .route("/assignments", get(list_assignments))
        .route("/assignments/{assignment_id}/marks", get(get_marks))
        // Reviews
        .route("/reviews", get(list_reviews))
        .route("/reviews", patch(patch_review))
        // Critiques
        .route("/critiques", patch(patch_critique))
        .route("/critiques/responses", post(respond_critique))
}

/// Parses the raw body so malformed JSON still gets the standard error body.
fn json_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))
}

async fn list_assignments(
    RequireCaller(caller): RequireCaller,
    State(state): State<Arc<AppState>>,
    Query(params): Query<AssignmentsParams>,
) -> impl IntoResponse {
    let assignments = state
        .engine
        .get_assignments_for(&caller, &params.into(), state.clock.now())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(assignments)))
}

async fn list_reviews(
    RequireCaller(caller): RequireCaller,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReviewsParams>,
) -> Result<Response, ApiError> {
    let now = state.clock.now();
    let response = match params.key()? {
        Some(key) => {
            let review = state.engine.get_review(&caller, &key, now)?;
            Json(ApiResponse::success(review)).into_response()
        }
        None => {
            let reviews = state.engine.get_reviews_for(&caller, now)?;
            Json(ApiResponse::success(reviews)).into_response()
        }
    };
    Ok(response)
}

async fn patch_review(
    RequireCaller(caller): RequireCaller,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    let body = json_body(&body)?;
    let outcome = state.engine.patch_review(&caller, &body, state.clock.now())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(outcome)))
}

async fn patch_critique(
    RequireCaller(caller): RequireCaller,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    let body = json_body(&body)?;
    let outcome = state
        .engine
        .patch_critique(&caller, &body, state.clock.now())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(outcome)))
}

async fn respond_critique(
    RequireCaller(caller): RequireCaller,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> impl IntoResponse {
    let body = json_body(&body)?;
    let outcome = state
        .engine
        .respond_critique(&caller, &body, state.clock.now())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(outcome)))
}

async fn get_marks(
    RequireCaller(caller): RequireCaller,
    State(state): State<Arc<AppState>>,
    Path(assignment_id): Path<String>,
    Query(params): Query<MarksParams>,
) -> impl IntoResponse {
    let marks = state.engine.get_marks_for(
        &caller,
        &assignment_id,
        params.worker_id.as_deref(),
        state.clock.now(),
    )?;
    Ok::<_, ApiError>(Json(ApiResponse::success(marks)))
}
