//! Common error handling utilities shared across the workspace.
//!
//! Standardized error types, error codes, and utilities used by every
//! crate in this workspace so that a failure deep in the sync engine or
//! the auth workflow surfaces as the same shape of error by the time it
//! reaches the HTTP boundary.
//!
//! # Error categories
//!
//! - **Validation**: input validation and data format errors
//! - **Authentication** / **Authorization**: identity and permission errors
//! - **Database**: document-store errors
//! - **BusinessLogic**: conflict/uniqueness/identity-heuristic violations
//! - **System**: infrastructure-level errors
//!
//! # Example
//!
//! ```rust
//! use error_common::{CoreError, ErrorCode};
//!
//! fn validate_age(age: i64) -> Result<(), CoreError> {
//!     if !(0..=150).contains(&age) {
//!         return Err(CoreError::validation()
//!             .with_code(ErrorCode::INVALID_INPUT)
//!             .with_message("age out of range")
//!             .with_context("field", "age")
//!             .build());
//!     }
//!     Ok(())
//! }
//! ```

pub mod types;
pub mod context;
pub mod codes;
pub mod reporting;
pub mod sanitization;

pub use types::*;
pub use context::*;
pub use codes::*;
pub use reporting::*;
