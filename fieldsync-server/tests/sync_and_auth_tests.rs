//! HTTP-surface integration tests (§10.5, §8): drive the full `Router`
//! in-process with `tower::ServiceExt::oneshot`, the same pattern the
//! corpus uses elsewhere for exercising an `axum::Router` without binding a
//! real socket.

use auth_identity::IdentityConfig;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use email_service::{MailTransport, RecordingMailTransport};
use fieldsync_server::{create_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Router {
    let state = AppState::new(IdentityConfig::default(), Arc::new(RecordingMailTransport::default()) as Arc<dyn MailTransport>);
    create_app(state)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn get(app: &Router, uri: &str, bearer: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method("GET");
    if let Some(token) = bearer {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let app = test_app();
    let (status, body) = get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn register_then_login_issues_bearer_token() {
    let app = test_app();
    let (status, body) = post(
        &app,
        "/api/register",
        json!({"name": "Ana", "email": "ana@x.io", "password": "hunter2!", "role": "volunteer"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["uid"].is_string());

    let (status, body) = post(&app, "/api/login", json!({"email": "ana@x.io", "password": "hunter2!"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expiresIn"], "2h");
    assert!(body["token"].as_str().unwrap().len() > 10);
}

#[tokio::test]
async fn duplicate_registration_email_is_conflict() {
    let app = test_app();
    post(
        &app,
        "/api/register",
        json!({"name": "Ana", "email": "dup@x.io", "password": "hunter2!"}),
    )
    .await;
    let (status, _) = post(
        &app,
        "/api/register",
        json!({"name": "Ana Two", "email": "dup@x.io", "password": "hunter2!"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_protected_requires_bearer_and_admin_role() {
    let app = test_app();
    let (status, _) = get(&app, "/api/test-protected", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    post(
        &app,
        "/api/register",
        json!({"name": "Vera", "email": "vera@x.io", "password": "hunter2!", "role": "volunteer"}),
    )
    .await;
    let (_, login_body) = post(&app, "/api/login", json!({"email": "vera@x.io", "password": "hunter2!"})).await;
    let token = login_body["token"].as_str().unwrap();
    let (status, _) = get(&app, "/api/test-protected", Some(token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    post(
        &app,
        "/api/register",
        json!({"name": "Admin", "email": "admin@x.io", "password": "hunter2!", "role": "admin"}),
    )
    .await;
    let (_, login_body) = post(&app, "/api/login", json!({"email": "admin@x.io", "password": "hunter2!"})).await;
    let token = login_body["token"].as_str().unwrap();
    let (status, body) = get(&app, "/api/test-protected", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
}

async fn bearer_token(app: &Router, email: &str) -> String {
    post(
        app,
        "/api/register",
        json!({"name": "Field Worker", "email": email, "password": "hunter2!", "role": "fieldworker"}),
    )
    .await;
    let (_, body) = post(app, "/api/login", json!({"email": email, "password": "hunter2!"})).await;
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn fresh_user_sync_creates_record() {
    let app = test_app();
    let token = bearer_token(&app, "sync1@x.io").await;
    let (status, body) = post(
        &app,
        "/api/sync/user",
        json!({
            "user_id": "u1",
            "name": "Ana",
            "email": "ana-sync@x.io",
            "role": "volunteer",
            "updated_at": "2024-03-01T10:00:00Z",
        }),
    )
    .await;
    let _ = token;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "created");
    assert_eq!(body["data"]["user_id"], "u1");
}

#[tokio::test]
async fn stale_user_update_reports_conflict_with_allowed_strategies() {
    let app = test_app();
    post(
        &app,
        "/api/sync/user",
        json!({
            "user_id": "u2",
            "name": "Ben",
            "email": "ben@x.io",
            "role": "volunteer",
            "updated_at": "2024-03-01T10:00:00Z",
        }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/sync/user",
        json!({
            "user_id": "u2",
            "name": "Ben",
            "email": "ben@x.io",
            "role": "volunteer",
            "updated_at": "2024-02-01T10:00:00Z",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict_field"], "updated_at");
    let strategies: Vec<&str> = body["allowed_strategies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(strategies, vec!["client_wins", "server_wins", "merge", "update_data"]);
}

/// Two registrations sharing the exact identity triple (person_name, age,
/// gender) satisfy the Registration identity heuristic's primary criterion
/// (name+gender equal AND >=2 criticals), so the second POST is classified
/// as the same person and auto-merged into the first record rather than
/// rejected as a distinct-entity collision (see DESIGN.md).
#[tokio::test]
async fn registration_same_person_auto_merges() {
    let app = test_app();
    post(
        &app,
        "/api/sync/registration",
        json!({
            "registration_id": "r1",
            "user_id": "u1",
            "person_name": "Ram",
            "age": 40,
            "gender": "male",
            "location_id": "l1",
            "status": "pending",
            "updated_at": "2024-03-01T10:00:00Z",
        }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/sync/registration",
        json!({
            "registration_id": "r2",
            "user_id": "u1",
            "person_name": "Ram",
            "age": 40,
            "gender": "male",
            "location_id": "l1",
            "status": "in_progress",
            "updated_at": "2024-03-02T10:00:00Z",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "auto_merged");
    assert_eq!(body["resolved_as"], "same_registration_detected");
}

/// Two tasks sharing title+location_id (Task's composite-unique fields) but
/// differing on created_by, due_date, and priority fall short of the Task
/// identity heuristic's "title equal AND >=2 criticals" threshold (only
/// location_id matches), so the collision is reported rather than merged.
#[tokio::test]
async fn task_title_location_collision_is_conflict() {
    let app = test_app();
    let (status, _) = post(
        &app,
        "/api/sync/task",
        json!({
            "task_id": "t1",
            "title": "Deliver supplies",
            "location_id": "loc1",
            "created_by": "u1",
            "due_date": "2024-03-05T10:00:00Z",
            "priority": "low",
            "status": "todo",
            "updated_at": "2024-03-01T10:00:00Z",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &app,
        "/api/sync/task",
        json!({
            "task_id": "t2",
            "title": "Deliver supplies",
            "location_id": "loc1",
            "created_by": "u2",
            "due_date": "2024-04-01T10:00:00Z",
            "priority": "high",
            "status": "todo",
            "updated_at": "2024-03-02T10:00:00Z",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflict_type"], "unique_constraint");
}

#[tokio::test]
async fn task_resolve_conflict_merge_follows_status_lattice() {
    let app = test_app();
    post(
        &app,
        "/api/sync/task",
        json!({
            "task_id": "t1",
            "title": "Deliver supplies",
            "status": "in_progress",
            "priority": "normal",
            "created_by": "u1",
            "due_date": "2024-03-05T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z",
        }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/sync/task/resolve-conflict",
        json!({
            "strategy": "merge",
            "task_id": "t1",
            "title": "Deliver supplies",
            "status": "completed",
            "priority": "normal",
            "created_by": "u1",
            "due_date": "2024-03-05T10:00:00Z",
            "updated_at": "2024-03-06T10:00:00Z",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolvedData"]["status"], "completed");
    assert_eq!(body["isNewTask"], false);
}

#[tokio::test]
async fn supply_resolve_conflict_sums_quantities() {
    let app = test_app();
    post(
        &app,
        "/api/sync/supply",
        json!({
            "supply_id": "s1",
            "user_id": "u1",
            "item_name": "Bandages",
            "quantity": 5,
            "expiry_date": "2025-01-01T00:00:00Z",
            "location_id": "l1",
            "status": "active",
            "updated_at": "2024-03-01T10:00:00Z",
        }),
    )
    .await;

    let (status, body) = post(
        &app,
        "/api/sync/supply/resolve-conflict",
        json!({
            "strategy": "sum_quantities",
            "supply_id": "s1",
            "user_id": "u1",
            "item_name": "Bandages",
            "quantity": 3,
            "expiry_date": "2025-01-01T00:00:00Z",
            "location_id": "l1",
            "status": "active",
            "updated_at": "2024-03-02T10:00:00Z",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolvedData"]["quantity"], 8);
}

#[tokio::test]
async fn forgot_password_verify_and_reset_round_trip() {
    let app = test_app();
    post(
        &app,
        "/api/register",
        json!({"name": "Cora", "email": "cora@x.io", "password": "hunter2!"}),
    )
    .await;

    let (status, _) = post(&app, "/api/forgot-password", json!({"email": "cora@x.io"})).await;
    assert_eq!(status, StatusCode::OK);

    // The OTP itself is delivered out-of-band (the recording mail transport
    // captures it); this test only exercises the reachable HTTP contract.
    let (status, _) = post(
        &app,
        "/api/reset-password",
        json!({"email": "cora@x.io", "new_password": "short", "confirm_password": "short"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
