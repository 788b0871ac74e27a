//! Bearer-token minting and verification (§6). Payload carries
//! `{uid, email, role, iat, exp}`, signed HS256, with a configurable expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub uid: String,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn mint(
    uid: &str,
    email: &str,
    role: &str,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        uid: uid.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(expiry_hours)).timestamp(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let token = mint("u1", "a@x.io", "volunteer", "secret", 2).unwrap();
        let claims = verify(&token, "secret").unwrap();
        assert_eq!(claims.uid, "u1");
        assert_eq!(claims.role, "volunteer");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = mint("u1", "a@x.io", "volunteer", "secret", 2).unwrap();
        assert!(verify(&token, "wrong-secret").is_err());
    }
}
