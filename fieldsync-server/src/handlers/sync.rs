//! `POST /api/sync/{entity}` and `POST /api/sync/{entity}/resolve-conflict`
//! (§6): the HTTP face of the SyncEngine's two state machines (§4.7).

use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use sync_engine::{EntityKind, Record, RecordExt, SyncOutcome};
use tracing::info;

fn parse_entity(entity: &str) -> Result<EntityKind, ApiError> {
    EntityKind::from_str(entity).ok_or_else(|| ApiError::validation(format!("unknown entity '{}'", entity)))
}

/// The PascalCase entity name used in the `isNew<Entity>` resolve-conflict
/// response field (§6).
fn entity_pascal_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "User",
        EntityKind::Registration => "Registration",
        EntityKind::Supply => "Supply",
        EntityKind::Task => "Task",
        EntityKind::TaskAssignment => "TaskAssignment",
        EntityKind::Location => "Location",
        EntityKind::Alert => "Alert",
        EntityKind::Notification => "Notification",
    }
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub status: &'static str,
    pub data: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_as: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
}

/// `client_password` rides alongside a User sync payload under `password`
/// so the same-user-by-password identity heuristic (§4.6, §9) can run; it
/// is never persisted into the record itself.
///
/// Unauthenticated by design (§6): field devices sync before they have a
/// chance to authenticate, so this surface only ever returns 200/400/404/409/500.
pub async fn sync(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(mut body): Json<Record>,
) -> Result<Json<SyncResponse>, ApiError> {
    let kind = parse_entity(&entity)?;
    let client_password = if kind == EntityKind::User {
        body.remove("password").and_then(|v| v.as_str().map(str::to_string))
    } else {
        None
    };

    info!(entity = %kind, "sync request received");
    let outcome = state
        .sync_engine
        .sync(kind, body, client_password.as_deref())
        .await?;

    let response = match outcome {
        SyncOutcome::Created(data) => SyncResponse {
            success: true,
            status: "created",
            data,
            resolved_as: None,
            server_id: None,
        },
        SyncOutcome::Updated(data) => SyncResponse {
            success: true,
            status: "updated",
            data,
            resolved_as: None,
            server_id: None,
        },
        SyncOutcome::AutoMerged {
            record,
            resolved_as,
            server_id,
        } => SyncResponse {
            success: true,
            status: "auto_merged",
            data: record,
            resolved_as: Some(resolved_as),
            server_id: Some(server_id),
        },
    };
    Ok(Json(response))
}

#[derive(Debug, serde::Deserialize)]
pub struct ResolveConflictBody {
    pub strategy: String,
    #[serde(flatten)]
    pub client_data: Record,
}

#[derive(Debug, Serialize)]
pub struct ResolveConflictResponse {
    pub success: bool,
    pub status: &'static str,
    pub message: &'static str,
    #[serde(flatten)]
    pub primary_key: Record,
    #[serde(rename = "resolvedData")]
    pub resolved_data: Record,
    #[serde(flatten)]
    pub is_new_entity: Record,
    pub resolution_strategy: String,
    pub allowed_strategies: Vec<String>,
    pub client_id: String,
    pub server_id: String,
}

pub async fn resolve_conflict(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Json(body): Json<ResolveConflictBody>,
) -> Result<Json<ResolveConflictResponse>, ApiError> {
    let kind = parse_entity(&entity)?;
    let pk_field = kind.primary_key_field();
    let pk = body
        .client_data
        .str_field(pk_field)
        .ok_or_else(|| ApiError::validation(format!("{} is required", pk_field)))?
        .to_string();

    info!(entity = %kind, pk = %pk, strategy = %body.strategy, "resolve-conflict request received");
    let outcome = state
        .sync_engine
        .resolve_conflict(kind, &pk, &body.strategy, body.client_data)
        .await?;

    let mut primary_key = Record::new();
    primary_key.insert(pk_field.to_string(), Value::String(outcome.client_id.clone()));

    let mut is_new_entity = Record::new();
    is_new_entity.insert(
        format!("isNew{}", entity_pascal_name(kind)),
        Value::Bool(outcome.is_new),
    );

    Ok(Json(ResolveConflictResponse {
        success: true,
        status: "resolved",
        message: "conflict resolved",
        primary_key,
        resolved_data: outcome.resolved_data,
        is_new_entity,
        resolution_strategy: outcome.resolution_strategy,
        allowed_strategies: outcome.allowed_strategies,
        client_id: outcome.client_id,
        server_id: outcome.server_id,
    }))
}
