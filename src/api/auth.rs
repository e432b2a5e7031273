//! Admin authentication.
//!
//! Admin credentials come from configuration. A successful admin login
//! returns a signed token that the `/api/admin/*` routes require.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Subject and role carried by admin tokens.
pub const ADMIN_ROLE: &str = "admin";

/// JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Errors from token verification.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("token does not grant admin access")]
    NotAdmin,
}

/// Everything the handlers need to authenticate an admin.
#[derive(Clone)]
pub struct AuthSettings {
    /// `None` disables admin login entirely.
    pub admin: Option<AdminCredentials>,
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

/// The configured admin email and password.
#[derive(Clone)]
pub struct AdminCredentials {
    email: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Constant-time check of both fields.
    pub fn matches(&self, email: &str, password: &str) -> bool {
        let email_ok = self.email.as_bytes().ct_eq(email.as_bytes());
        let password_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        bool::from(email_ok & password_ok)
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Constant-time comparison of a submitted password with a stored one.
pub fn password_matches(stored: &str, submitted: &str) -> bool {
    bool::from(stored.as_bytes().ct_eq(submitted.as_bytes()))
}

/// Create an admin token valid for `ttl`.
pub fn create_admin_token(
    secret: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: ADMIN_ROLE.to_string(),
        role: ADMIN_ROLE.to_string(),
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a token and check that it carries the admin role.
pub fn verify_admin_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    if token_data.claims.role != ADMIN_ROLE {
        return Err(TokenError::NotAdmin);
    }
    Ok(token_data.claims)
}
