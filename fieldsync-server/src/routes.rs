//! Route table (§6): health, auth/OTP, and the per-entity sync surface.

use crate::handlers::{auth, health, sync};
use crate::server::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/forgot-password", post(auth::forgot_password))
        .route("/api/verify-otp", post(auth::verify_otp))
        .route("/api/reset-password", post(auth::reset_password))
        .route("/api/test-protected", get(auth::test_protected))
        .route("/api/sync/:entity", post(sync::sync))
        .route("/api/sync/:entity/resolve-conflict", post(sync::resolve_conflict))
}
