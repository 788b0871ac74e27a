use sync_engine::DocStoreError;
use thiserror::Error;

/// Errors surfaced by an [`crate::store::AuthStore`] implementation (§4.2).
#[derive(Debug, Error, Clone)]
pub enum AuthStoreError {
    #[error("user not found")]
    NotFound,

    #[error("email already registered")]
    EmailAlreadyExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("transient auth-store failure: {0}")]
    Transient(String),
}

/// Errors surfaced by the auth/OTP workflow (C8), mapped 1:1 onto §7's
/// taxonomy by the HTTP boundary: `Validation`/`UnknownStrategy`-equivalent
/// -> 400, `InvalidCredentials` -> 401, `NotFound` -> 404,
/// `EmailAlreadyExists` -> 409, `Transient` -> 500.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("email already registered")]
    EmailAlreadyExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not found")]
    NotFound,

    #[error("transient failure: {0}")]
    Transient(String),

    #[error("token error: {0}")]
    Token(String),

    #[error(transparent)]
    Doc(#[from] DocStoreError),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

impl IdentityError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<AuthStoreError> for IdentityError {
    fn from(e: AuthStoreError) -> Self {
        match e {
            AuthStoreError::NotFound => IdentityError::NotFound,
            AuthStoreError::EmailAlreadyExists => IdentityError::EmailAlreadyExists,
            AuthStoreError::InvalidCredentials => IdentityError::InvalidCredentials,
            AuthStoreError::Transient(msg) => IdentityError::Transient(msg),
        }
    }
}
