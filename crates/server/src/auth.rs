//! Password hashing and bearer-token issuance.
//!
//! The engine treats identity as opaque; everything credential-shaped lives
//! here. Tokens are HS256 JWTs carrying the user id in `sub`.

use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::ServerError;

pub(crate) struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: usize,
    exp: usize,
}

impl TokenIssuer {
    pub(crate) fn new(secret: &[u8], token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            token_ttl,
        }
    }

    pub(crate) fn issue(&self, user_id: i64) -> Result<String, ServerError> {
        let now = chrono::Utc::now().timestamp();
        let exp = now + self.token_ttl.as_secs() as i64;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now as usize,
            exp: exp as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| ServerError::Internal(format!("failed to sign token: {err}")))
    }

    /// Validates a bearer token and returns the user id it names.
    pub(crate) fn validate(&self, token: &str) -> Result<i64, ServerError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| ServerError::Unauthorized)?;
        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| ServerError::Unauthorized)
    }

    pub(crate) fn expires_in(&self) -> u64 {
        self.token_ttl.as_secs()
    }
}

pub(crate) fn hash_password(password: &str) -> Result<String, ServerError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServerError::Internal(format!("failed to hash password: {err}")))
}

/// Uniform failure: a malformed stored hash and a wrong password are
/// indistinguishable to the caller.
pub(crate) fn verify_password(hash: &str, candidate: &str) -> Result<(), ServerError> {
    let parsed = PasswordHash::new(hash).map_err(|_| ServerError::Unauthorized)?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|_| ServerError::Unauthorized)
}
