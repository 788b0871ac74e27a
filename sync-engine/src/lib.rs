//! Offline-first per-entity synchronization and conflict-resolution engine.
//!
//! Composes a document-store adapter (C1), a validator per entity (C3), a
//! timestamp kit (C4), a conflict-resolution algebra (C5), and identity
//! heuristics (C6) into the `sync` / `resolve-conflict` state machines (C7)
//! that the HTTP surface calls into.

pub mod conflict;
pub mod docstore;
pub mod engine;
pub mod entity;
pub mod error;
pub mod identity;
pub mod record;
pub mod timestamp;
pub mod validation;

pub use conflict::{
    allowed_strategies, AVERAGE_QUANTITIES, CLIENT_WINS, MERGE, SERVER_WINS, SUM_QUANTITIES,
    UPDATE_DATA,
};
pub use docstore::{DocStore, InMemoryDocStore};
pub use engine::{NoPasswordVerifier, PasswordVerifier, ResolveOutcome, SyncEngine, SyncOutcome};
pub use entity::EntityKind;
pub use error::{ConflictDetail, DocStoreError, SyncError, SyncResult};
pub use record::{Record, RecordExt};
