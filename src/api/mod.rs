//! API handlers for the Libreria REST endpoints

pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{
        header::AUTHORIZATION,
        request::Parts,
        HeaderMap, HeaderName, HeaderValue,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{Book, PublicUser, TokenClaims, TokenRejection, TokenScheme},
    AppState,
};

/// Raw token header accepted alongside `Authorization: Bearer`
pub const AUTH_TOKEN_HEADER: &str = "auth-token";
/// Response header carrying the token issued at login
pub const USER_TOKEN_HEADER: &str = "user-token";

/// `{data: ...}` envelope used by create-style responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(BookResponse = DataResponse<Book>, UserResponse = DataResponse<PublicUser>, LoginResponse = DataResponse<users::LoginData>)]
pub struct DataResponse<T> {
    pub data: T,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pull the token from `auth-token`, falling back to `Authorization: Bearer`.
/// An `Authorization` header with another scheme is an invalid token, not a missing one.
pub fn presented_token(headers: &HeaderMap) -> Result<(TokenScheme, String), TokenRejection> {
    let raw = headers
        .get(AUTH_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if let Some(token) = raw {
        return Ok((TokenScheme::AuthToken, token.to_string()));
    }

    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(TokenRejection::Missing)?;

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(TokenRejection::Invalid(format!(
            "unsupported authorization scheme {}",
            scheme
        )));
    }
    let token = token.trim();
    if token.is_empty() {
        Err(TokenRejection::Missing)
    } else {
        Ok((TokenScheme::Bearer, token.to_string()))
    }
}

/// Extractor for a caller holding a valid, active token
pub struct AuthenticatedUser {
    pub claims: TokenClaims,
    pub token: String,
    pub scheme: TokenScheme,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let (scheme, token) = presented_token(&parts.headers)
            .map_err(|reason| AppError::token(TokenScheme::Bearer, reason))?;

        let claims = state
            .services
            .auth
            .validate_token(&token)
            .await
            .map_err(|reason| AppError::token(scheme, reason))?;

        Ok(AuthenticatedUser {
            claims,
            token,
            scheme,
        })
    }
}

/// JSON body extractor whose rejections use the API error shape
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(USER_TOKEN_HEADER)]);

    let endpoint = Router::new()
        .route("/", get(health::service_status))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Users
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login))
        .route("/users/logout", post(users::logout))
        .route("/users/me", get(users::me))
        // Books
        .route("/libros", get(books::list_books).post(books::create_book))
        .route("/libros/buscar", get(books::search_books))
        .route(
            "/libros/:id",
            get(books::get_book)
                .put(books::replace_book)
                .patch(books::patch_book)
                .delete(books::delete_book),
        )
        .with_state(state);

    Router::new()
        .nest("/endpoint", endpoint)
        .merge(openapi::create_openapi_router())
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-powered-by"),
            HeaderValue::from_static("Library API"),
        ))
}
