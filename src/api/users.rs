//! User registration and session endpoints

use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{LoginRequest, RegisterUser},
        PublicUser,
    },
    AppState,
};

use super::{
    ApiJson, AuthenticatedUser, DataResponse, LoginResponse, MessageResponse, UserResponse,
    USER_TOKEN_HEADER,
};

/// Body of a successful login; the token itself travels in the `user-token` header
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginData {
    pub message: String,
    pub name: String,
    pub email: String,
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users/register",
    tag = "users",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input or email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterUser>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.services.auth.register(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PublicUser::from(user),
        }),
    ))
}

/// Log in and receive a token
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse,
            headers(("user-token" = String, description = "Token to present on protected routes"))),
        (status = 400, description = "Unknown user or wrong password", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginRequest>,
) -> AppResult<(HeaderMap, Json<LoginResponse>)> {
    let (token, user) = state.services.auth.login(input).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(USER_TOKEN_HEADER),
        HeaderValue::from_str(&token)
            .map_err(|e| AppError::Internal(format!("Token is not a valid header value: {}", e)))?,
    );

    Ok((
        headers,
        Json(DataResponse {
            data: LoginData {
                message: format!("Welcome {} - {}", user.name, user.email),
                name: user.name,
                email: user.email,
            },
        }),
    ))
}

/// Revoke the presented token
#[utoipa::path(
    post,
    path = "/users/logout",
    tag = "users",
    security(("bearer_auth" = []), ("auth_token" = [])),
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "No token supplied", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> AppResult<Json<MessageResponse>> {
    state.services.auth.revoke(&caller.token).await?;
    tracing::info!(user_id = %caller.claims.id, scheme = %caller.scheme, "User logged out");
    Ok(Json(MessageResponse::new("Logged out")))
}

/// Profile of the token's owner
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = []), ("auth_token" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "No token supplied", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.auth.get_user(caller.claims.id).await?;
    Ok(Json(DataResponse {
        data: PublicUser::from(user),
    }))
}
