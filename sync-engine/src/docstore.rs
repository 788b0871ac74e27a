//! DocStore adapter (C1): a typed wrapper over the external document store.
//! The real backing store (Firestore-shaped in the system this engine was
//! modeled on, but genuinely arbitrary) is an external collaborator per the
//! scope of this crate; what lives here is the trait boundary plus an
//! in-memory reference implementation, adequate for a single-process
//! deployment and for the test suite.

use crate::entity::EntityKind;
use crate::error::DocStoreError;
use crate::record::Record;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait DocStore: Send + Sync {
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, DocStoreError>;

    /// Inserts a new document, stamping `created_at` and `updated_at` with
    /// the store's server-assigned timestamp unless the record already
    /// carries `updated_at` (per §4.1).
    async fn set(&self, kind: EntityKind, id: &str, record: Record) -> Result<Record, DocStoreError>;

    /// Applies a partial patch to an existing document, stamping
    /// `updated_at` unless the patch supplies one.
    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Record,
    ) -> Result<Record, DocStoreError>;

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), DocStoreError>;

    /// Single-field equality query, used by the secondary-uniqueness probe
    /// (§4.7 step 4). Returns `(id, record)` pairs.
    async fn where_equals(
        &self,
        kind: EntityKind,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Record)>, DocStoreError>;
}

type Collection = HashMap<String, Record>;

/// In-memory reference [`DocStore`]. Not a production backing store; it
/// exists so the engine is runnable and testable without a real external
/// dependency, matching the "opaque collaborator" framing of this crate's
/// scope.
#[derive(Default)]
pub struct InMemoryDocStore {
    collections: RwLock<HashMap<EntityKind, Collection>>,
}

impl InMemoryDocStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn stamp_server_timestamp(record: &mut Record, field: &str) {
        if !record.contains_key(field) || record.get(field).map(Value::is_null).unwrap_or(false) {
            record.insert(field.to_string(), Value::String(Utc::now().to_rfc3339()));
        }
    }
}

#[async_trait]
impl DocStore for InMemoryDocStore {
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, DocStoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(&kind).and_then(|c| c.get(id).cloned()))
    }

    async fn set(&self, kind: EntityKind, id: &str, mut record: Record) -> Result<Record, DocStoreError> {
        Self::stamp_server_timestamp(&mut record, "created_at");
        Self::stamp_server_timestamp(&mut record, "updated_at");
        let mut collections = self.collections.write().await;
        collections
            .entry(kind)
            .or_default()
            .insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &str,
        patch: Record,
    ) -> Result<Record, DocStoreError> {
        let mut collections = self.collections.write().await;
        let collection = collections.entry(kind).or_default();
        let mut merged = collection.get(id).cloned().unwrap_or_default();
        for (k, v) in patch {
            merged.insert(k, v);
        }
        Self::stamp_server_timestamp(&mut merged, "updated_at");
        collection.insert(id.to_string(), merged.clone());
        Ok(merged)
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), DocStoreError> {
        let mut collections = self.collections.write().await;
        if let Some(collection) = collections.get_mut(&kind) {
            collection.remove(id);
        }
        Ok(())
    }

    async fn where_equals(
        &self,
        kind: EntityKind,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Record)>, DocStoreError> {
        let collections = self.collections.read().await;
        let Some(collection) = collections.get(&kind) else {
            return Ok(Vec::new());
        };
        Ok(collection
            .iter()
            .filter(|(_, record)| record.get(field) == Some(value))
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = InMemoryDocStore::new();
        let record = json!({"user_id": "u1", "name": "Ana"}).as_object().unwrap().clone();
        store.set(EntityKind::User, "u1", record).await.unwrap();
        let fetched = store.get(EntityKind::User, "u1").await.unwrap().unwrap();
        assert_eq!(fetched.get("name").unwrap(), "Ana");
        assert!(fetched.contains_key("created_at"));
        assert!(fetched.contains_key("updated_at"));
    }

    #[tokio::test]
    async fn where_equals_excludes_non_matching() {
        let store = InMemoryDocStore::new();
        let a = json!({"user_id": "u1", "email": "a@x.io"}).as_object().unwrap().clone();
        let b = json!({"user_id": "u2", "email": "b@x.io"}).as_object().unwrap().clone();
        store.set(EntityKind::User, "u1", a).await.unwrap();
        store.set(EntityKind::User, "u2", b).await.unwrap();
        let hits = store
            .where_equals(EntityKind::User, "email", &json!("a@x.io"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, "u1");
    }
}
