use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::AUTHORIZATION, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{HeaderError, extract_token_from_header};
use super::verifier::verify_with_timeout;
use crate::error::Error;
use crate::server::AppState;
use crate::visibility::Caller;

/// Extractor that requires a verified token belonging to a known user.
pub struct RequireCaller(pub Caller);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    UnknownUser,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::UnknownUser => (StatusCode::UNAUTHORIZED, "No user for this token"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "data": null, "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"peermark\""),
            );
        }

        response
    }
}

impl From<HeaderError> for AuthError {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::InvalidScheme => AuthError::InvalidScheme,
            HeaderError::Malformed => AuthError::InvalidToken,
        }
    }
}

impl FromRequestParts<Arc<AppState>> for RequireCaller {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let raw_token = extract_token_from_header(auth_header)?.ok_or(AuthError::MissingAuth)?;

        let timeout = state.engine.timing().verify_timeout();
        let identity = verify_with_timeout(state.verifier.as_ref(), &raw_token, timeout)
            .await
            .map_err(|e| match e {
                Error::InvalidTokenFormat => AuthError::InvalidToken,
                Error::TokenExpired => AuthError::TokenExpired,
                e => {
                    tracing::error!("Token verification failed: {e}");
                    AuthError::InternalError
                }
            })?
            .ok_or(AuthError::InvalidToken)?;

        let user = state
            .engine
            .store()
            .find_user_by_email(&identity.email)
            .map_err(|e| {
                tracing::error!("Failed to resolve token owner: {e}");
                AuthError::InternalError
            })?
            .ok_or(AuthError::UnknownUser)?;

        Ok(RequireCaller(Caller {
            user_id: user.user_id,
            is_admin: identity.is_admin || user.is_admin,
        }))
    }
}
