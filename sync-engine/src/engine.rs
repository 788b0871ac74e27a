//! SyncEngine (C7): the per-entity driver that composes validators (C3),
//! the timestamp kit (C4), conflict algebra (C5), identity heuristics (C6),
//! and the DocStore adapter (C1) into the two state machines of §4.7.

use crate::conflict::{self, allowed_strategies};
use crate::docstore::DocStore;
use crate::entity::EntityKind;
use crate::error::{ConflictDetail, SyncError, SyncResult};
use crate::identity;
use crate::record::{Record, RecordExt};
use crate::timestamp::to_instant_or_now;
use crate::validation;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Supplies the password-hash-match signal used by the User identity
/// heuristic (§4.6, §9). Implemented by the auth crate over its AuthStore;
/// the sync engine never sees a plaintext password or a hash directly.
#[async_trait]
pub trait PasswordVerifier: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> bool;
}

/// A verifier that never reports a match, for entities/deployments where
/// the password-based heuristic signal isn't wired up.
pub struct NoPasswordVerifier;

#[async_trait]
impl PasswordVerifier for NoPasswordVerifier {
    async fn verify(&self, _email: &str, _password: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Created(Record),
    Updated(Record),
    AutoMerged {
        record: Record,
        resolved_as: String,
        server_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct ResolveOutcome {
    pub resolved_data: Record,
    pub is_new: bool,
    pub resolution_strategy: String,
    pub allowed_strategies: Vec<String>,
    pub client_id: String,
    pub server_id: String,
}

pub struct SyncEngine<S: DocStore> {
    store: Arc<S>,
    password_verifier: Arc<dyn PasswordVerifier>,
}

impl<S: DocStore> SyncEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            password_verifier: Arc::new(NoPasswordVerifier),
        }
    }

    pub fn with_password_verifier(store: Arc<S>, verifier: Arc<dyn PasswordVerifier>) -> Self {
        Self {
            store,
            password_verifier: verifier,
        }
    }

    /// `sync` state machine (§4.7).
    pub async fn sync(
        &self,
        kind: EntityKind,
        client: Record,
        client_password: Option<&str>,
    ) -> SyncResult<SyncOutcome> {
        // 1. Validate
        validation::validate(kind, &client)?;

        let pk_field = kind.primary_key_field();
        let pk = client
            .str_field(pk_field)
            .expect("validated above: primary key is present")
            .to_string();

        // 2. Primary lookup
        let existing = self.store.get(kind, &pk).await?;

        // 3. Staleness check
        if let Some(server) = &existing {
            let client_t = to_instant_or_now(client.get("updated_at"));
            let server_t = to_instant_or_now(server.get("updated_at"));
            if client_t < server_t {
                let strategies: Vec<String> =
                    allowed_strategies(kind, true).into_iter().map(String::from).collect();
                return Err(SyncError::conflict(ConflictDetail {
                    error: "stale update".to_string(),
                    conflict_field: "updated_at".to_string(),
                    conflict_type: None,
                    latest_data: Value::Object(server.clone()),
                    allowed_strategies: strategies,
                    client_id: Some(pk.clone()),
                    server_id: Some(pk.clone()),
                }));
            }
        }

        // 4. Secondary-uniqueness probe
        let email_for_password_check = client.str_field("email").map(str::to_string);
        if let Some(outcome) = self
            .probe_secondary_uniqueness(kind, &pk, &client, existing.is_some(), client_password, email_for_password_check)
            .await?
        {
            return Ok(outcome);
        }

        // 5. Safe write
        let was_new = existing.is_none();
        let written = if was_new {
            self.store.set(kind, &pk, client).await?
        } else {
            self.store.update(kind, &pk, client).await?
        };

        Ok(if was_new {
            SyncOutcome::Created(written)
        } else {
            SyncOutcome::Updated(written)
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn probe_secondary_uniqueness(
        &self,
        kind: EntityKind,
        pk: &str,
        client: &Record,
        update_path: bool,
        client_password: Option<&str>,
        client_email: Option<String>,
    ) -> SyncResult<Option<SyncOutcome>> {
        let candidates = self.find_uniqueness_hits(kind, pk, client).await?;

        for (hit_id, hit_record) in candidates {
            let password_matches = match (client_password, &client_email) {
                (Some(password), Some(email)) => self.password_verifier.verify(email, password).await,
                _ => false,
            };

            if identity::is_same_entity(kind, client, &hit_record, password_matches) {
                if !update_path {
                    // create path: auto-merge
                    let mut merged = hit_record.clone();
                    for (k, v) in client {
                        merged.insert(k.clone(), v.clone());
                    }
                    merged.insert(
                        kind.primary_key_field().to_string(),
                        Value::String(hit_id.clone()),
                    );
                    merged.insert(
                        "updated_at".to_string(),
                        Value::String(chrono::Utc::now().to_rfc3339()),
                    );
                    let written = self.store.update(kind, &hit_id, merged).await?;
                    return Ok(Some(SyncOutcome::AutoMerged {
                        record: written,
                        resolved_as: format!("same_{}_detected", kind.as_str().replace('-', "_")),
                        server_id: hit_id,
                    }));
                }
                return Err(SyncError::conflict(ConflictDetail {
                    error: "potential duplicate".to_string(),
                    conflict_field: "secondary_unique".to_string(),
                    conflict_type: Some(format!(
                        "potential_duplicate_{}",
                        kind.as_str().replace('-', "_")
                    )),
                    latest_data: Value::Object(hit_record),
                    allowed_strategies: vec![
                        conflict::CLIENT_WINS.to_string(),
                        conflict::SERVER_WINS.to_string(),
                        conflict::MERGE.to_string(),
                    ],
                    client_id: Some(pk.to_string()),
                    server_id: Some(hit_id),
                }));
            }

            let mut strategies: Vec<String> = vec![conflict::CLIENT_WINS.to_string()];
            if update_path {
                strategies = vec![
                    conflict::CLIENT_WINS.to_string(),
                    conflict::SERVER_WINS.to_string(),
                    conflict::MERGE.to_string(),
                    conflict::UPDATE_DATA.to_string(),
                ];
            }
            return Err(SyncError::conflict(ConflictDetail {
                error: "unique constraint violated".to_string(),
                conflict_field: "secondary_unique".to_string(),
                conflict_type: Some("unique_constraint".to_string()),
                latest_data: Value::Object(hit_record),
                allowed_strategies: strategies,
                client_id: Some(pk.to_string()),
                server_id: Some(hit_id),
            }));
        }

        Ok(None)
    }

    async fn find_uniqueness_hits(
        &self,
        kind: EntityKind,
        pk: &str,
        client: &Record,
    ) -> SyncResult<Vec<(String, Record)>> {
        let mut hits = Vec::new();

        for field in kind.secondary_unique_fields() {
            if let Some(value) = client.get(*field).filter(|v| !v.is_null()) {
                let found = self.store.where_equals(kind, field, value).await?;
                hits.extend(found.into_iter().filter(|(id, _)| id != pk));
            }
        }

        if let Some(fields) = kind.composite_unique_fields() {
            if fields.iter().all(|f| client.get(*f).is_some_and(|v| !v.is_null())) {
                let first_field = fields[0];
                let found = self
                    .store
                    .where_equals(kind, first_field, client.get(first_field).unwrap())
                    .await?;
                for (id, record) in found {
                    if id == pk {
                        continue;
                    }
                    let matches_all = fields
                        .iter()
                        .all(|f| record.get(*f) == client.get(*f));
                    if matches_all {
                        hits.push((id, record));
                    }
                }
            }
        }

        hits.sort_by(|a, b| a.0.cmp(&b.0));
        hits.dedup_by(|a, b| a.0 == b.0);
        Ok(hits)
    }

    /// `resolve-conflict` state machine (§4.7).
    pub async fn resolve_conflict(
        &self,
        kind: EntityKind,
        pk: &str,
        strategy: &str,
        client_data: Record,
    ) -> SyncResult<ResolveOutcome> {
        let existing = self.store.get(kind, pk).await?;

        match existing {
            None => {
                if strategy != conflict::CLIENT_WINS {
                    return Err(SyncError::UnknownStrategy(format!(
                        "{} requires an existing server document",
                        strategy
                    )));
                }
                if let Some(_hit) = self
                    .find_uniqueness_hits(kind, pk, &client_data)
                    .await?
                    .into_iter()
                    .next()
                {
                    return Err(SyncError::conflict(ConflictDetail {
                        error: "unique constraint violated".to_string(),
                        conflict_field: "secondary_unique".to_string(),
                        conflict_type: Some("unique_constraint".to_string()),
                        latest_data: Value::Object(client_data.clone()),
                        allowed_strategies: vec![conflict::CLIENT_WINS.to_string()],
                        client_id: Some(pk.to_string()),
                        server_id: None,
                    }));
                }
                let written = self.store.set(kind, pk, client_data).await?;
                Ok(ResolveOutcome {
                    resolved_data: written,
                    is_new: true,
                    resolution_strategy: strategy.to_string(),
                    allowed_strategies: vec![conflict::CLIENT_WINS.to_string()],
                    client_id: pk.to_string(),
                    server_id: pk.to_string(),
                })
            }
            Some(server_data) => {
                let legal = allowed_strategies(kind, true);
                if !legal.contains(&strategy) {
                    return Err(SyncError::UnknownStrategy(strategy.to_string()));
                }
                if strategy == conflict::UPDATE_DATA {
                    if let Some(hit) = self
                        .find_uniqueness_hits(kind, pk, &client_data)
                        .await?
                        .into_iter()
                        .next()
                    {
                        return Err(SyncError::conflict(ConflictDetail {
                            error: "unique constraint violated".to_string(),
                            conflict_field: "secondary_unique".to_string(),
                            conflict_type: Some("unique_constraint".to_string()),
                            latest_data: Value::Object(hit.1),
                            allowed_strategies: legal.into_iter().map(String::from).collect(),
                            client_id: Some(pk.to_string()),
                            server_id: Some(hit.0),
                        }));
                    }
                }
                let resolved = conflict::apply(kind, strategy, &client_data, Some(&server_data))?;
                let written = self.store.update(kind, pk, resolved).await?;
                Ok(ResolveOutcome {
                    resolved_data: written,
                    is_new: false,
                    resolution_strategy: strategy.to_string(),
                    allowed_strategies: legal.into_iter().map(String::from).collect(),
                    client_id: pk.to_string(),
                    server_id: pk.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstore::InMemoryDocStore;
    use serde_json::json;

    fn obj(v: serde_json::Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn fresh_user_sync_creates() {
        let store = Arc::new(InMemoryDocStore::new());
        let engine = SyncEngine::new(store);
        let client = obj(json!({
            "user_id": "u1", "name": "Ana", "email": "ana@x.io",
            "role": "volunteer", "updated_at": "2024-03-01T10:00:00Z"
        }));
        let outcome = engine.sync(EntityKind::User, client, None).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Created(_)));
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict() {
        let store = Arc::new(InMemoryDocStore::new());
        let engine = SyncEngine::new(store);
        let first = obj(json!({
            "user_id": "u1", "name": "Ana", "email": "ana@x.io",
            "role": "volunteer", "updated_at": "2024-03-01T10:00:00Z"
        }));
        engine.sync(EntityKind::User, first, None).await.unwrap();

        let stale = obj(json!({
            "user_id": "u1", "name": "Ana", "email": "ana@x.io",
            "role": "volunteer", "updated_at": "2024-02-01T10:00:00Z"
        }));
        let result = engine.sync(EntityKind::User, stale, None).await;
        match result {
            Err(SyncError::Conflict(detail)) => {
                assert_eq!(detail.conflict_field, "updated_at");
            }
            _ => panic!("expected conflict"),
        }
    }

    #[tokio::test]
    async fn registration_unique_collision_reported() {
        let store = Arc::new(InMemoryDocStore::new());
        let engine = SyncEngine::new(store);
        let first = obj(json!({
            "registration_id": "r1", "user_id": "u1", "person_name": "Ram",
            "age": 40, "gender": "male", "location_id": "l1",
            "updated_at": "2024-03-01T10:00:00Z"
        }));
        let outcome = engine.sync(EntityKind::Registration, first, None).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Created(_)));

        let second = obj(json!({
            "registration_id": "r2", "user_id": "u1", "person_name": "Someone Else",
            "age": 99, "gender": "male", "location_id": "l1",
            "updated_at": "2024-03-02T10:00:00Z"
        }));
        let result = engine.sync(EntityKind::Registration, second, None).await;
        match result {
            Err(SyncError::Conflict(detail)) => {
                assert_eq!(detail.conflict_type.as_deref(), Some("unique_constraint"));
            }
            other => panic!("expected unique_constraint conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn task_resolve_conflict_merge_takes_higher_status() {
        let store = Arc::new(InMemoryDocStore::new());
        let engine = SyncEngine::new(store);
        let first = obj(json!({
            "task_id": "t1", "title": "Restock", "status": "in_progress",
            "priority": "normal", "created_by": "u1", "due_date": "2024-03-10T00:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }));
        engine.sync(EntityKind::Task, first, None).await.unwrap();

        let client_data = obj(json!({
            "task_id": "t1", "title": "Restock", "status": "completed",
            "priority": "normal", "created_by": "u1", "due_date": "2024-03-10T00:00:00Z",
            "updated_at": "2024-02-01T10:00:00Z"
        }));
        let outcome = engine
            .resolve_conflict(EntityKind::Task, "t1", conflict::MERGE, client_data)
            .await
            .unwrap();
        assert_eq!(outcome.resolved_data.str_field("status"), Some("completed"));
    }

    #[tokio::test]
    async fn supply_resolve_conflict_sum_quantities() {
        let store = Arc::new(InMemoryDocStore::new());
        let engine = SyncEngine::new(store);
        let first = obj(json!({
            "supply_id": "s1", "user_id": "u1", "item_name": "Bandages",
            "quantity": 5, "location_id": "l1", "expiry_date": "2025-01-01T00:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }));
        engine.sync(EntityKind::Supply, first, None).await.unwrap();

        let client_data = obj(json!({"quantity": 3}));
        let outcome = engine
            .resolve_conflict(EntityKind::Supply, "s1", conflict::SUM_QUANTITIES, client_data)
            .await
            .unwrap();
        assert_eq!(outcome.resolved_data.i64_field("quantity"), Some(8));
    }
}
