//! Issued token records and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Row of the tokens table: one per minted token
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct TokenRecord {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    /// Cleared only by an explicit logout
    pub active: bool,
    pub issued_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Build a fresh active record for a just-minted token
    pub fn active(email: &str, token: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            token: token.to_string(),
            active: true,
            issued_at: Utc::now(),
        }
    }
}

/// JWT payload carried by every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// User id
    pub id: Uuid,
    pub email: String,
    /// Unique token id, keeps two tokens minted in the same second distinct
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// How the caller presented its token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScheme {
    /// Raw token in the custom `auth-token` header
    AuthToken,
    /// `Authorization: Bearer <token>`
    Bearer,
}

impl TokenScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenScheme::AuthToken => "auth-token",
            TokenScheme::Bearer => "Bearer token",
        }
    }
}

impl std::fmt::Display for TokenScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a presented token was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRejection {
    /// No token in either header
    Missing,
    /// Token string is not in the token store
    Unknown,
    /// Stored row has `active = false`
    Revoked,
    /// Signature is fine but `exp` has passed
    Expired,
    /// Signature or payload did not verify
    Invalid(String),
    /// The token store could not be queried
    Unavailable(String),
}

impl TokenRejection {
    /// Human-readable message naming the scheme the caller used
    pub fn describe(&self, scheme: TokenScheme) -> String {
        match self {
            TokenRejection::Missing => {
                "No token supplied: expected an auth-token header or an Authorization: Bearer header"
                    .to_string()
            }
            TokenRejection::Unknown => format!("{} is not valid", scheme),
            TokenRejection::Revoked => format!("{} revoked", scheme),
            TokenRejection::Expired => format!("{} expired", scheme),
            TokenRejection::Invalid(detail) => format!("{} is not valid: {}", scheme, detail),
            TokenRejection::Unavailable(_) => "Internal server error".to_string(),
        }
    }
}
