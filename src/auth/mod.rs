use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token claims. Issued by the identity layer when an admin signs
/// in; this service only validates and refreshes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub super_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, super_admin: bool, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email,
            super_admin,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("invalid JWT secret")]
    InvalidSecret,
}

/// Signs a claims set. The secret is passed in (not read from global config)
/// so the gate and its tests can run against arbitrary keys.
pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn issue_session_token(
    user_id: Uuid,
    email: &str,
    super_admin: bool,
    secret: &str,
    expiry_hours: u64,
) -> Result<String, JwtError> {
    let claims = Claims::new(user_id, email.to_string(), super_admin, expiry_hours);
    encode_claims(&claims, secret)
}

pub fn verify_session_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let user_id = Uuid::new_v4();
        let token = issue_session_token(user_id, "dono@loja.com", false, "segredo", 24).unwrap();
        let claims = verify_session_token(&token, "segredo").unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "dono@loja.com");
        assert!(!claims.super_admin);
    }

    #[test]
    fn rejects_wrong_secret_and_empty_secret() {
        let token = issue_session_token(Uuid::new_v4(), "x@y.com", false, "a", 24).unwrap();
        assert!(verify_session_token(&token, "b").is_err());
        assert!(matches!(
            verify_session_token(&token, ""),
            Err(JwtError::InvalidSecret)
        ));
    }
}
