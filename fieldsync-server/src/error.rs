//! HTTP-boundary error type (§7, §10.2). Every typed error from the sync
//! engine or the auth/identity crate converges here into the taxonomy the
//! external interface promises: `Validation`/`Auth`/`Forbidden`/`NotFound`
//! map onto a plain `{error}` envelope, `Conflict` onto the richer 409 body
//! of §6, `Transient` onto 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use sync_engine::{ConflictDetail, SyncError};
use tracing::{debug, error, warn};

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Auth(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    SyncConflict(Box<ConflictDetail>),
    Transient(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                debug!(error = %message, "validation failed");
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Auth(message) => {
                debug!(error = %message, "authentication failed");
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Forbidden(message) => {
                debug!(error = %message, "authorization failed");
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Conflict(message) => {
                warn!(error = %message, "conflict");
                (StatusCode::CONFLICT, Json(json!({ "error": message }))).into_response()
            }
            ApiError::SyncConflict(detail) => {
                warn!(conflict_field = %detail.conflict_field, conflict_type = ?detail.conflict_type, "sync conflict reported");
                (StatusCode::CONFLICT, Json(detail)).into_response()
            }
            ApiError::Transient(message) => {
                error!(error = %message, "transient failure");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
            }
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Validation { field, reason } => {
                ApiError::Validation(format!("{}: {}", field, reason))
            }
            SyncError::UnknownStrategy(message) => ApiError::Validation(message),
            SyncError::NotFound => ApiError::NotFound("record not found".to_string()),
            SyncError::Conflict(detail) => ApiError::SyncConflict(detail),
            SyncError::Store(store_err) => ApiError::Transient(store_err.to_string()),
        }
    }
}

impl From<auth_identity::IdentityError> for ApiError {
    fn from(e: auth_identity::IdentityError) -> Self {
        use auth_identity::IdentityError;
        match e {
            IdentityError::Validation { field, reason } => {
                ApiError::Validation(format!("{}: {}", field, reason))
            }
            IdentityError::EmailAlreadyExists => {
                ApiError::Conflict("an account with this email already exists".to_string())
            }
            IdentityError::InvalidCredentials => {
                ApiError::Auth("invalid email or password".to_string())
            }
            IdentityError::NotFound => ApiError::NotFound("no account for this email".to_string()),
            IdentityError::Transient(message) => ApiError::Transient(message),
            IdentityError::Token(message) => ApiError::Transient(message),
            IdentityError::Doc(doc_err) => ApiError::Transient(doc_err.to_string()),
        }
    }
}
