pub mod redactor;
pub mod macros;
pub mod config;

pub use redactor::*;
pub use config::*;

/// Logging helper with automatic PII redaction.
///
/// Field records carry personally-identifying data (names, emails, phone
/// numbers); this crate provides a redaction pass so that logging a full
/// record for debugging does not leak that data into log storage.
///
/// # Detected data types
///
/// - Email addresses: `user@example.com` → `u***@e***.com`
/// - Phone numbers: `(555) 123-4567` → `(***) ***-****`
/// - Custom patterns: configurable regex/replacement pairs
///
/// # Example
///
/// ```rust
/// use logger_redacted::{PiiRedactor, RedactionConfig};
///
/// let redactor = PiiRedactor::new(RedactionConfig::default());
/// let redacted = redactor.redact("contact ana@example.com or 555-123-4567");
/// assert!(!redacted.contains("ana@example.com"));
/// ```
