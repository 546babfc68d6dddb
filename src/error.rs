//! Error types for the Libreria API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::token::{TokenRejection, TokenScheme};

/// Application error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchItem = 5,
    BadValue = 18,
    TokenMissing = 30,
    TokenInvalid = 31,
    TokenRevoked = 32,
    TokenExpired = 33,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("{}", .reason.describe(*.scheme))]
    Token {
        scheme: TokenScheme,
        reason: TokenRejection,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn token(scheme: TokenScheme, reason: TokenRejection) -> Self {
        AppError::Token { scheme, reason }
    }

    /// HTTP status and error code for this error
    pub fn status_and_code(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchItem),
            AppError::UnknownUser(_) => (StatusCode::BAD_REQUEST, ErrorCode::NoSuchUser),
            AppError::InvalidCredentials(_) => (StatusCode::BAD_REQUEST, ErrorCode::NotAuthorized),
            AppError::Token { reason, .. } => match reason {
                TokenRejection::Missing => (StatusCode::UNAUTHORIZED, ErrorCode::TokenMissing),
                TokenRejection::Unknown | TokenRejection::Invalid(_) => {
                    (StatusCode::BAD_REQUEST, ErrorCode::TokenInvalid)
                }
                TokenRejection::Revoked => (StatusCode::BAD_REQUEST, ErrorCode::TokenRevoked),
                TokenRejection::Expired => (StatusCode::BAD_REQUEST, ErrorCode::TokenExpired),
                TokenRejection::Unavailable(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure)
                }
            },
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::UnknownUser(msg)
            | AppError::InvalidCredentials(msg) => msg.clone(),
            AppError::Token { scheme, reason } => {
                if let TokenRejection::Unavailable(detail) = reason {
                    tracing::error!("Token store unavailable: {}", detail);
                }
                reason.describe(*scheme)
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let message = fields
            .first()
            .and_then(|(field, errs)| {
                errs.first().map(|e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid ({})", field, e.code),
                })
            })
            .unwrap_or_else(|| "Invalid input".to_string());

        AppError::Validation(message)
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
