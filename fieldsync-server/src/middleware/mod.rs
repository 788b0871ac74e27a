//! Middleware modules for request processing.

pub mod auth_context;

pub use auth_context::{AdminContext, AuthContext};
