//! OTP record store for the forgot-password / verify-otp / reset-password
//! flow (§4.9). Ephemeral by design: a row is deleted once reset-password
//! succeeds, and is simply overwritten by a fresh forgot-password call.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct OtpRecord {
    otp: u32,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("no otp issued for this email")]
    NotFound,
    #[error("otp has expired")]
    Expired,
    #[error("otp does not match")]
    Mismatch,
}

#[derive(Default)]
pub struct OtpStore {
    records: RwLock<HashMap<String, OtpRecord>>,
}

impl OtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a uniformly random six-digit code and stores it, valid for
    /// ten minutes from now.
    pub async fn issue(&self, email: &str) -> u32 {
        let otp = rand::thread_rng().gen_range(100_000..=999_999);
        let record = OtpRecord {
            otp,
            expires_at: Utc::now() + Duration::minutes(10),
        };
        self.records.write().await.insert(email.to_string(), record);
        otp
    }

    /// Expiry is inclusive: a check performed at exactly `expires_at`
    /// succeeds, one second later it does not.
    pub async fn verify(&self, email: &str, candidate: u32) -> Result<(), OtpError> {
        let records = self.records.read().await;
        let record = records.get(email).ok_or(OtpError::NotFound)?;
        if Utc::now() > record.expires_at {
            return Err(OtpError::Expired);
        }
        if record.otp != candidate {
            return Err(OtpError::Mismatch);
        }
        Ok(())
    }

    pub async fn clear(&self, email: &str) {
        self.records.write().await.remove(email);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn issue_then_verify_succeeds() {
        let store = OtpStore::new();
        let otp = store.issue("a@x.io").await;
        assert!(store.verify("a@x.io", otp).await.is_ok());
    }

    #[tokio::test]
    async fn mismatch_rejected() {
        let store = OtpStore::new();
        store.issue("a@x.io").await;
        assert!(matches!(store.verify("a@x.io", 1).await, Err(OtpError::Mismatch)));
    }

    #[tokio::test]
    async fn clear_removes_record() {
        let store = OtpStore::new();
        let otp = store.issue("a@x.io").await;
        store.clear("a@x.io").await;
        assert!(matches!(store.verify("a@x.io", otp).await, Err(OtpError::NotFound)));
    }
}
