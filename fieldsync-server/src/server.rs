//! Application state: the wiring point for the DocStore, AuthStore, mail
//! transport, and JWT configuration that every handler shares.

use auth_identity::{AuthService, IdentityConfig, InMemoryAuthStore};
use email_service::MailTransport;
use std::sync::Arc;
use sync_engine::{InMemoryDocStore, SyncEngine};

/// The mail transport is held as a trait object so tests can wire in
/// [`email_service::RecordingMailTransport`] without the state type changing
/// shape (§10.4).
pub type Auth = AuthService<InMemoryDocStore, InMemoryAuthStore, dyn MailTransport>;

#[derive(Clone)]
pub struct AppState {
    pub docstore: Arc<InMemoryDocStore>,
    pub sync_engine: Arc<SyncEngine<InMemoryDocStore>>,
    pub auth: Arc<Auth>,
    pub identity_config: IdentityConfig,
}

impl AppState {
    pub fn new(identity_config: IdentityConfig, mail: Arc<dyn MailTransport>) -> Self {
        let docstore = Arc::new(InMemoryDocStore::new());
        let authstore = Arc::new(InMemoryAuthStore::new());
        let password_verifier = Arc::new(auth_identity::AuthStorePasswordVerifier::new(authstore.clone()));
        let sync_engine = Arc::new(SyncEngine::with_password_verifier(docstore.clone(), password_verifier));
        let auth = Arc::new(AuthService::new(docstore.clone(), authstore, mail, identity_config.clone()));

        Self {
            docstore,
            sync_engine,
            auth,
            identity_config,
        }
    }
}
