//! Authentication service: registration, login, token issue and validation

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{normalize_email, LoginRequest, RegisterUser},
        NewUser, TokenClaims, TokenRejection, User,
    },
    repository::Repository,
};

/// HS256 signing material plus the token lifetime
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            ttl: Duration::hours(config.jwt_expiration_hours as i64),
        }
    }

    /// Mint a fresh token for `user`, valid for the configured lifetime
    pub fn sign(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        self.sign_claims(&TokenClaims {
            id: user.id,
            email: user.email.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        })
    }

    pub fn sign_claims(&self, claims: &TokenClaims) -> AppResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Check signature and expiry
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenRejection> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Invalid(e.to_string()),
            })
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Compare a plaintext password with a stored Argon2 hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    keys: TokenKeys,
}

impl AuthService {
    pub fn new(repository: Repository, config: &AuthConfig) -> Self {
        Self {
            repository,
            keys: TokenKeys::new(config),
        }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    /// Create an account. Emails are unique after normalization.
    pub async fn register(&self, input: RegisterUser) -> AppResult<User> {
        let input = input.normalized();
        input.validate()?;
        let email = input.email;

        if self.repository.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::Validation("Email already registered".to_string()));
        }

        let new_user = NewUser {
            name: input.name,
            email,
            password_hash: hash_password(&input.password)?,
        };

        let user = self
            .repository
            .users
            .create(&new_user)
            .await?
            .ok_or_else(|| AppError::Validation("Email already registered".to_string()))?;

        tracing::info!(user_id = %user.id, email = %user.email, "User registered");
        Ok(user)
    }

    /// Check credentials and return the token to hand to the caller
    pub async fn login(&self, input: LoginRequest) -> AppResult<(String, User)> {
        input.validate()?;
        let email = normalize_email(&input.email);

        let user = self
            .repository
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::UnknownUser("User not found".to_string()))?;

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::InvalidCredentials("Invalid password".to_string()));
        }

        let token = self.issue_token(&user).await?;
        Ok((token, user))
    }

    /// Reuse the user's active token while it still verifies; otherwise discard it and mint
    /// a new one. The store decides the winner when two logins race.
    pub async fn issue_token(&self, user: &User) -> AppResult<String> {
        let tokens = &self.repository.tokens;

        if let Some(existing) = tokens.find_active(&user.email).await? {
            match self.keys.verify(&existing.token) {
                Ok(_) => {
                    tracing::debug!(email = %user.email, "Reusing active token");
                    return Ok(existing.token);
                }
                Err(reason) => {
                    tokens.delete(&existing.token).await?;
                    tracing::info!(email = %user.email, reason = ?reason, "Discarded stale token");
                }
            }
        }

        let minted = self.keys.sign(user)?;
        let claimed = tokens.claim_active(&user.email, &minted).await?;

        if claimed.token == minted {
            tracing::info!(email = %user.email, "Minted new token");
        } else {
            tracing::warn!(email = %user.email, "Concurrent login already holds the active token");
        }

        Ok(claimed.token)
    }

    /// Store lookup, then active flag, then signature and expiry
    pub async fn validate_token(&self, token: &str) -> Result<TokenClaims, TokenRejection> {
        let record = match self.repository.tokens.find_by_token(token).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(TokenRejection::Unknown),
            Err(e) => return Err(TokenRejection::Unavailable(e.to_string())),
        };

        if !record.active {
            return Err(TokenRejection::Revoked);
        }

        self.keys.verify(token)
    }

    /// Mark a token inactive
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        if self.repository.tokens.deactivate(token).await? {
            tracing::info!("Token revoked");
            Ok(())
        } else {
            Err(AppError::NotFound("Token not found".to_string()))
        }
    }

    pub async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.repository
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
