//! Mail transport: the OTP dispatch step of the auth workflow needs to send
//! mail without the rest of the system hard-coding a provider. `MailTransport`
//! is the trait boundary; `SmtpMailTransport` is the one concrete sender.

use crate::error::{MailError, MailResult};
use async_trait::async_trait;
use mail_builder::MessageBuilder;
use mail_send::SmtpClientBuilder;
use std::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> MailResult<()>;
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_email: String,
    pub from_name: String,
}

impl SmtpConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            use_tls: std::env::var("SMTP_TLS_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            from_email: std::env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@fieldsync.local".to_string()),
            from_name: std::env::var("MAIL_FROM_NAME").unwrap_or_else(|_| "FieldSync".to_string()),
        }
    }
}

pub struct SmtpMailTransport {
    config: SmtpConfig,
}

impl SmtpMailTransport {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> MailResult<()> {
        let message = MessageBuilder::new()
            .from((self.config.from_name.as_str(), self.config.from_email.as_str()))
            .to(to)
            .subject(subject)
            .text_body(body);

        let mut builder = SmtpClientBuilder::new(self.config.host.as_str(), self.config.port)
            .implicit_tls(self.config.use_tls);
        if let (Some(user), Some(pass)) = (&self.config.username, &self.config.password) {
            builder = builder.credentials((user.as_str(), pass.as_str()));
        }

        let mut client = builder
            .connect()
            .await
            .map_err(|e| MailError::SendFailed(format!("SMTP connection failed: {}", e)))?;

        client
            .send(message)
            .await
            .map_err(|e| MailError::SendFailed(format!("failed to send mail: {}", e)))?;

        debug!(to, "mail sent");
        Ok(())
    }
}

/// Records sent mail instead of dispatching it. Used by tests and by
/// deployments that run with mail disabled.
#[derive(Default)]
pub struct RecordingMailTransport {
    pub sent: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl MailTransport for RecordingMailTransport {
    async fn send(&self, to: &str, subject: &str, body: &str) -> MailResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_transport_captures_sent_mail() {
        let transport = RecordingMailTransport::default();
        transport.send("a@x.io", "subject", "body").await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "a@x.io");
    }
}
