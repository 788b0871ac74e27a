//! Register / login / forgot-password / verify-otp / reset-password / the
//! bearer-protected smoke-test route (§6). Thin adapters over
//! `auth_identity::AuthService`; all real validation and workflow logic
//! lives in that crate.

use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::server::AppState;
use auth_identity::RegisterRequest;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub uid: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let uid = state
        .auth
        .register(RegisterRequest {
            name: body.name,
            email: body.email,
            password: body.password,
            role: body.role,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { uid })))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: &'static str,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError> {
    let result = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(LoginResponse {
        token: result.token,
        expires_in: result.expires_in,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordBody {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.forgot_password(&body.email).await?;
    Ok(Json(MessageResponse {
        message: "reset code sent",
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpBody {
    pub email: String,
    pub otp: u32,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth.verify_otp(&body.email, body.otp).await?;
    Ok(Json(MessageResponse { message: "otp valid" }))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordBody {
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth
        .reset_password(&body.email, &body.new_password, &body.confirm_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "password reset",
    }))
}

#[derive(Debug, Serialize)]
pub struct TestProtectedResponse {
    pub uid: String,
    pub email: String,
    pub role: String,
}

/// `GET /api/test-protected` (§6): 401 without a valid bearer token, 403
/// with a valid token lacking the `admin` role, 200 otherwise.
pub async fn test_protected(AdminContext(ctx): AdminContext) -> Json<TestProtectedResponse> {
    Json(TestProtectedResponse {
        uid: ctx.uid,
        email: ctx.email,
        role: ctx.role,
    })
}
