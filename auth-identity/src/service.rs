//! Auth / OTP workflow (C8): register, login, forgot-password, verify-otp,
//! reset-password. Composes the AuthStore (C2), the user-profile collection
//! in DocStore (C1), the OTP store, and a mail transport.

use crate::config::IdentityConfig;
use crate::error::{AuthStoreError, IdentityError, IdentityResult};
use crate::jwt;
use crate::otp::{OtpError, OtpStore};
use crate::store::{AuthStore, UserPatch};
use crate::validation::{normalize_email, validate_email, validate_password};
use async_trait::async_trait;
use chrono::Utc;
use email_service::MailTransport;
use serde_json::Value;
use std::sync::Arc;
use sync_engine::{DocStore, EntityKind, Record, RecordExt};
use tracing::warn;

pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

pub struct LoginResult {
    pub token: String,
    pub expires_in: &'static str,
}

pub struct AuthService<S: DocStore, A: AuthStore, M: MailTransport + ?Sized> {
    docstore: Arc<S>,
    authstore: Arc<A>,
    mail: Arc<M>,
    otp: OtpStore,
    config: IdentityConfig,
}

impl<S: DocStore, A: AuthStore, M: MailTransport + ?Sized> AuthService<S, A, M> {
    pub fn new(docstore: Arc<S>, authstore: Arc<A>, mail: Arc<M>, config: IdentityConfig) -> Self {
        Self {
            docstore,
            authstore,
            mail,
            otp: OtpStore::new(),
            config,
        }
    }

    /// Register (§4.9): validate, create the auth-store user, stamp the
    /// role claim, then write a matching profile keyed by the same uid.
    pub async fn register(&self, req: RegisterRequest) -> IdentityResult<String> {
        validate_email(&req.email)?;
        validate_password(&req.password, self.config.password_min_length)?;
        let email = normalize_email(&req.email);
        let role = req.role.unwrap_or_else(|| "volunteer".to_string());

        let uid = match self.authstore.create_user(&email, &req.password, &req.name).await {
            Ok(uid) => uid,
            Err(AuthStoreError::EmailAlreadyExists) => return Err(IdentityError::EmailAlreadyExists),
            Err(e) => return Err(e.into()),
        };
        self.authstore.set_custom_claims(&uid, &role).await?;

        let mut profile = Record::new();
        profile.insert("user_id".to_string(), Value::String(uid.clone()));
        profile.insert("name".to_string(), Value::String(req.name));
        profile.insert("email".to_string(), Value::String(email));
        profile.insert("role".to_string(), Value::String(role));
        profile.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        self.docstore.set(EntityKind::User, &uid, profile).await?;

        Ok(uid)
    }

    /// Login (§4.9): verify against the auth store, mint a 2-hour bearer
    /// token carrying `{uid, email, role}`.
    pub async fn login(&self, email: &str, password: &str) -> IdentityResult<LoginResult> {
        let email = normalize_email(email);
        let uid = self
            .authstore
            .verify_password(&email, password)
            .await
            .map_err(|_| IdentityError::InvalidCredentials)?;
        let user = self.authstore.get_user(&uid).await?;
        let token = jwt::mint(&uid, &email, &user.role, &self.config.jwt_secret, self.config.jwt_expiry_hours)
            .map_err(|e| IdentityError::Token(e.to_string()))?;
        Ok(LoginResult {
            token,
            expires_in: "2h",
        })
    }

    /// Forgot-password (§4.9): requires an existing profile, issues and
    /// mails a six-digit OTP good for ten minutes.
    pub async fn forgot_password(&self, email: &str) -> IdentityResult<()> {
        let email = normalize_email(email);
        let hits = self
            .docstore
            .where_equals(EntityKind::User, "email", &Value::String(email.clone()))
            .await?;
        if hits.is_empty() {
            return Err(IdentityError::NotFound);
        }
        let otp = self.otp.issue(&email).await;
        let body = format!("Your password reset code is {}. It expires in 10 minutes.", otp);
        self.mail
            .send(&email, "Your password reset code", &body)
            .await
            .map_err(|e| IdentityError::Transient(e.to_string()))?;
        Ok(())
    }

    /// Verify-OTP (§4.9): compares against the issued record; expiry is
    /// checked before the value match.
    pub async fn verify_otp(&self, email: &str, otp: u32) -> IdentityResult<()> {
        let email = normalize_email(email);
        self.otp.verify(&email, otp).await.map_err(|e| match e {
            OtpError::NotFound => IdentityError::validation("otp", "no otp issued for this email"),
            OtpError::Expired => IdentityError::validation("otp", "otp has expired"),
            OtpError::Mismatch => IdentityError::validation("otp", "otp does not match"),
        })
    }

    /// Reset-password (§4.9): tolerates a divergence between the auth
    /// store and the profile store left by earlier bugs, and repairs it so
    /// both sides agree on one uid afterward.
    pub async fn reset_password(&self, email: &str, new_password: &str, confirm: &str) -> IdentityResult<()> {
        validate_password(new_password, self.config.password_min_length)?;
        if new_password != confirm {
            return Err(IdentityError::validation("confirm_password", "passwords do not match"));
        }
        let email = normalize_email(email);

        let hits = self
            .docstore
            .where_equals(EntityKind::User, "email", &Value::String(email.clone()))
            .await?;
        let (profile_uid, profile) = hits.into_iter().next().ok_or(IdentityError::NotFound)?;

        let uid = match self.authstore.get_user(&profile_uid).await {
            Ok(_) => profile_uid.clone(),
            Err(AuthStoreError::NotFound) => {
                warn!(email = %email, "auth-store/profile uid divergence detected during reset, repairing");
                self.repair_uid_divergence(&email, &profile_uid, &profile, new_password).await?
            }
            Err(e) => return Err(e.into()),
        };

        self.authstore
            .update_user(
                &uid,
                UserPatch {
                    password: Some(new_password.to_string()),
                    ..Default::default()
                },
            )
            .await?;

        let mut patch = Record::new();
        patch.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        self.docstore.update(EntityKind::User, &uid, patch).await?;
        self.otp.clear(&email).await;
        Ok(())
    }

    async fn repair_uid_divergence(
        &self,
        email: &str,
        profile_uid: &str,
        profile: &Record,
        new_password: &str,
    ) -> IdentityResult<String> {
        match self.authstore.get_user_by_email(email).await {
            Ok(existing) if existing.uid != profile_uid => {
                self.migrate_profile(profile_uid, &existing.uid, profile.clone()).await?;
                Ok(existing.uid)
            }
            Ok(existing) => Ok(existing.uid),
            Err(AuthStoreError::NotFound) => {
                let name = profile.str_field("name").unwrap_or("").to_string();
                let role = profile.str_field("role").unwrap_or("volunteer").to_string();
                let new_uid = self.authstore.create_user(email, new_password, &name).await?;
                self.authstore.set_custom_claims(&new_uid, &role).await?;
                self.migrate_profile(profile_uid, &new_uid, profile.clone()).await?;
                Ok(new_uid)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn migrate_profile(&self, old_uid: &str, new_uid: &str, mut profile: Record) -> IdentityResult<()> {
        if old_uid == new_uid {
            return Ok(());
        }
        profile.insert("user_id".to_string(), Value::String(new_uid.to_string()));
        self.docstore.delete(EntityKind::User, old_uid).await?;
        self.docstore.set(EntityKind::User, new_uid, profile).await?;
        Ok(())
    }
}

/// Bridges [`AuthStore::verify_password`] to the sync engine's password-based
/// identity heuristic signal (§4.6, §9): the heuristic only ever sees a
/// boolean match, never the plaintext password or the stored hash.
pub struct AuthStorePasswordVerifier<A: AuthStore> {
    store: Arc<A>,
}

impl<A: AuthStore> AuthStorePasswordVerifier<A> {
    pub fn new(store: Arc<A>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<A: AuthStore> sync_engine::PasswordVerifier for AuthStorePasswordVerifier<A> {
    async fn verify(&self, email: &str, password: &str) -> bool {
        self.store.verify_password(email, password).await.is_ok()
    }
}
