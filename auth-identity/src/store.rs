//! AuthStore adapter (C2): the identity-provider abstraction. Keyed by uid
//! rather than by entity-kind/primary-key the way [`sync_engine::DocStore`]
//! is; owns the password hash and never exposes plaintext beyond this
//! boundary. The in-memory reference implementation hashes with Argon2id,
//! the same KDF a production identity provider would use, since
//! `verifyPassword` underlies both login and the same-user-by-password
//! identity heuristic.

use crate::error::AuthStoreError;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier as Argon2Verify};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub password: Option<String>,
}

#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, AuthStoreError>;
    async fn get_user(&self, uid: &str) -> Result<AuthUser, AuthStoreError>;
    async fn get_user_by_email(&self, email: &str) -> Result<AuthUser, AuthStoreError>;
    async fn update_user(&self, uid: &str, patch: UserPatch) -> Result<AuthUser, AuthStoreError>;
    async fn set_custom_claims(&self, uid: &str, role: &str) -> Result<(), AuthStoreError>;
    async fn verify_password(&self, email: &str, password: &str) -> Result<String, AuthStoreError>;
}

pub struct InMemoryAuthStore {
    users: RwLock<HashMap<String, AuthUser>>,
    argon2: Argon2<'static>,
}

impl Default for InMemoryAuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAuthStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            argon2: Argon2::default(),
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthStoreError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthStoreError::Transient(format!("password hashing failed: {}", e)))
    }

    fn password_matches(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl AuthStore for InMemoryAuthStore {
    async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, AuthStoreError> {
        let normalized = email.trim().to_lowercase();
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == normalized) {
            return Err(AuthStoreError::EmailAlreadyExists);
        }
        let password_hash = self.hash_password(password)?;
        let uid = Uuid::new_v4().to_string();
        users.insert(
            uid.clone(),
            AuthUser {
                uid: uid.clone(),
                email: normalized,
                display_name: display_name.to_string(),
                password_hash,
                role: "user".to_string(),
            },
        );
        Ok(uid)
    }

    async fn get_user(&self, uid: &str) -> Result<AuthUser, AuthStoreError> {
        self.users
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or(AuthStoreError::NotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<AuthUser, AuthStoreError> {
        let normalized = email.trim().to_lowercase();
        self.users
            .read()
            .await
            .values()
            .find(|u| u.email == normalized)
            .cloned()
            .ok_or(AuthStoreError::NotFound)
    }

    async fn update_user(&self, uid: &str, patch: UserPatch) -> Result<AuthUser, AuthStoreError> {
        let new_hash = match &patch.password {
            Some(password) => Some(self.hash_password(password)?),
            None => None,
        };
        let mut users = self.users.write().await;
        let user = users.get_mut(uid).ok_or(AuthStoreError::NotFound)?;
        if let Some(email) = patch.email {
            user.email = email.trim().to_lowercase();
        }
        if let Some(name) = patch.display_name {
            user.display_name = name;
        }
        if let Some(hash) = new_hash {
            user.password_hash = hash;
        }
        Ok(user.clone())
    }

    async fn set_custom_claims(&self, uid: &str, role: &str) -> Result<(), AuthStoreError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(uid).ok_or(AuthStoreError::NotFound)?;
        user.role = role.to_string();
        Ok(())
    }

    async fn verify_password(&self, email: &str, password: &str) -> Result<String, AuthStoreError> {
        let user = self
            .get_user_by_email(email)
            .await
            .map_err(|_| AuthStoreError::InvalidCredentials)?;
        if self.password_matches(password, &user.password_hash) {
            Ok(user.uid)
        } else {
            Err(AuthStoreError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_verify_password() {
        let store = InMemoryAuthStore::new();
        let uid = store.create_user("a@x.io", "hunter22", "Ana").await.unwrap();
        let verified = store.verify_password("a@x.io", "hunter22").await.unwrap();
        assert_eq!(verified, uid);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let store = InMemoryAuthStore::new();
        store.create_user("a@x.io", "hunter22", "Ana").await.unwrap();
        let result = store.create_user("A@X.IO", "other-pass", "Ana2").await;
        assert!(matches!(result, Err(AuthStoreError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn wrong_password_rejected() {
        let store = InMemoryAuthStore::new();
        store.create_user("a@x.io", "hunter22", "Ana").await.unwrap();
        let result = store.verify_password("a@x.io", "wrong").await;
        assert!(matches!(result, Err(AuthStoreError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn uid_reassignment_via_update_user() {
        let store = InMemoryAuthStore::new();
        let uid = store.create_user("a@x.io", "hunter22", "Ana").await.unwrap();
        store
            .update_user(&uid, UserPatch { password: Some("newpass1".to_string()), ..Default::default() })
            .await
            .unwrap();
        let verified = store.verify_password("a@x.io", "newpass1").await.unwrap();
        assert_eq!(verified, uid);
    }
}
