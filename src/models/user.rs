//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Stored user record. Created at registration and never modified afterwards.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Argon2 hash, never serialized
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User as exposed by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 6, max = 255, message = "name must be between 6 and 255 characters"))]
    pub name: String,
    #[validate(
        length(min = 6, max = 255, message = "email must be between 6 and 255 characters"),
        email(message = "email must be a valid email")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 1024, message = "password must be between 6 and 1024 characters"))]
    pub password: String,
}

impl RegisterUser {
    /// Trim the name and normalize the email so validation sees what gets stored
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        length(min = 6, max = 255, message = "email must be between 6 and 255 characters"),
        email(message = "email must be a valid email")
    )]
    pub email: String,
    #[validate(length(min = 6, max = 1024, message = "password must be between 6 and 1024 characters"))]
    pub password: String,
}

/// Fields needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Emails are compared and stored trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
