//! Mail transport abstraction used by the auth workflow to dispatch OTP
//! codes. See [`transport::MailTransport`].

pub mod error;
pub mod transport;

pub use error::{MailError, MailResult};
pub use transport::{MailTransport, RecordingMailTransport, SmtpConfig, SmtpMailTransport};
