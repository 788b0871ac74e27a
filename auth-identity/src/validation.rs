use crate::error::IdentityError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub fn validate_email(email: &str) -> Result<(), IdentityError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(IdentityError::validation("email", "not a valid email address"))
    }
}

pub fn validate_password(password: &str, min_length: usize) -> Result<(), IdentityError> {
    if password.len() >= min_length {
        Ok(())
    } else {
        Err(IdentityError::validation(
            "password",
            format!("must be at least {} characters", min_length),
        ))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
