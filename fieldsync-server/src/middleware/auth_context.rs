//! Bearer-token authentication context, extracted from the
//! `Authorization: Bearer <token>` header (§6) via `auth_identity::jwt`.

use crate::error::ApiError;
use crate::server::AppState;
use async_trait::async_trait;
use auth_identity::jwt::{self, Claims};
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};

/// The authenticated caller's identity, decoded from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub uid: String,
    pub email: String,
    pub role: String,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.uid,
            email: claims.email,
            role: claims.role,
        }
    }
}

fn extract_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Auth("missing Authorization header".to_string()))?;
    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Auth("expected 'Bearer <token>'".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let claims = jwt::verify(token, &state.identity_config.jwt_secret)
            .map_err(|e| ApiError::Auth(format!("invalid or expired token: {}", e)))?;
        Ok(claims.into())
    }
}

/// An [`AuthContext`] additionally required to carry the `admin` role,
/// demonstrating the 403 branch of `GET /api/test-protected` (§6): a
/// missing/invalid token is a 401, a valid token lacking the role is a 403.
#[derive(Debug, Clone)]
pub struct AdminContext(pub AuthContext);

#[async_trait]
impl FromRequestParts<AppState> for AdminContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = AuthContext::from_request_parts(parts, state).await?;
        if ctx.role != "admin" {
            return Err(ApiError::Forbidden(format!(
                "role '{}' may not access this resource",
                ctx.role
            )));
        }
        Ok(AdminContext(ctx))
    }
}
