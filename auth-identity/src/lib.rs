//! User authentication, identity-provider adapter (C2), and the OTP-backed
//! password-reset workflow (C8).
//!
//! # Example
//!
//! ```
//! use auth_identity::{AuthService, IdentityConfig, InMemoryAuthStore, RegisterRequest};
//! use email_service::RecordingMailTransport;
//! use std::sync::Arc;
//! use sync_engine::InMemoryDocStore;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = AuthService::new(
//!     Arc::new(InMemoryDocStore::new()),
//!     Arc::new(InMemoryAuthStore::new()),
//!     Arc::new(RecordingMailTransport::default()),
//!     IdentityConfig::default(),
//! );
//!
//! service.register(RegisterRequest {
//!     name: "Ana".to_string(),
//!     email: "ana@example.org".to_string(),
//!     password: "hunter22".to_string(),
//!     role: None,
//! }).await.unwrap();
//! # }
//! ```

pub mod config;
pub mod error;
pub mod jwt;
pub mod otp;
pub mod service;
pub mod store;
pub mod validation;

pub use config::IdentityConfig;
pub use error::{AuthStoreError, IdentityError, IdentityResult};
pub use service::{AuthService, AuthStorePasswordVerifier, LoginResult, RegisterRequest};
pub use store::{AuthStore, AuthUser, InMemoryAuthStore, UserPatch};
