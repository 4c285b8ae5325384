//! Authentication Service
//!
//! Password hashing and signed access tokens.

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use voluntar_core::domain::user::{Role, User};

/// Service error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    TokenExpired,
    InvalidToken,
    HashingFailed(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::TokenExpired => write!(f, "token expired"),
            AuthError::InvalidToken => write!(f, "invalid token"),
            AuthError::HashingFailed(msg) => write!(f, "password hashing failed: {}", msg),
        }
    }
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 access tokens
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for the user valid from now
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now().timestamp())
    }

    fn issue_at(&self, user: &User, issued_at: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: issued_at,
            exp: issued_at.saturating_add(i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(|e| {
            tracing::error!("Failed to sign token: {}", e);
            AuthError::InvalidToken
        })
    }

    /// Verifies the signature and expiry of a token
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let mut parts = header?.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

// =============================================================================
// Password Hashing
// =============================================================================

#[cfg(not(test))]
fn argon2_config() -> argon2::Config<'static> {
    argon2::Config::default()
}

// Low-cost parameters for test builds
#[cfg(test)]
fn argon2_config() -> argon2::Config<'static> {
    argon2::Config {
        mem_cost: 256,
        time_cost: 1,
        ..argon2::Config::default()
    }
}

/// Hashes a password with a fresh random salt
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_owned();

    tokio::task::spawn_blocking(move || {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        argon2::hash_encoded(password.as_bytes(), &salt, &argon2_config())
    })
    .await
    .map_err(|e| AuthError::HashingFailed(e.to_string()))?
    .map_err(|e| AuthError::HashingFailed(e.to_string()))
}

/// Checks a password against a stored encoded hash
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: &str, encoded: &str) -> Result<bool, AuthError> {
    let password = password.to_owned();
    let encoded = encoded.to_owned();

    let verified = tokio::task::spawn_blocking(move || {
        argon2::verify_encoded(&encoded, password.as_bytes())
    })
    .await
    .map_err(|e| AuthError::HashingFailed(e.to_string()))?;

    match verified {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            Ok(false)
        }
    }
}
