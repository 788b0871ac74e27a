use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to send mail: {0}")]
    SendFailed(String),
}

pub type MailResult<T> = Result<T, MailError>;
