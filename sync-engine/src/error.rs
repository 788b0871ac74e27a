use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error taxonomy for the sync engine, mapped 1:1 onto HTTP status codes by
/// the server crate: validation/unknown-strategy -> 400, not-found -> 404,
/// conflict -> 409 (carries the richer [`ConflictDetail`]), anything from the
/// document store -> 500.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown resolution strategy: {0}")]
    UnknownStrategy(String),

    #[error("record not found")]
    NotFound,

    #[error("conflict")]
    Conflict(Box<ConflictDetail>),

    #[error("document store error: {0}")]
    Store(#[from] DocStoreError),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by a [`crate::docstore::DocStore`] implementation.
#[derive(Debug, Error, Clone)]
pub enum DocStoreError {
    #[error("transient store failure: {0}")]
    Transient(String),
}

/// The body of a 409 response (§6 of the spec this engine implements).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictDetail {
    pub error: String,
    pub conflict_field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_type: Option<String>,
    pub latest_data: serde_json::Value,
    pub allowed_strategies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
}

impl SyncError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn conflict(detail: ConflictDetail) -> Self {
        Self::Conflict(Box::new(detail))
    }
}
