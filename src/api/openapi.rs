//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, users};

/// Registers the two ways a token can be presented
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "auth_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(super::AUTH_TOKEN_HEADER))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Libreria API",
        version = "1.0.0",
        description = "Library catalog REST API"
    ),
    servers(
        (url = "/endpoint", description = "Library API")
    ),
    paths(
        // Health
        health::service_status,
        health::health_check,
        health::readiness_check,
        // Users
        users::register,
        users::login,
        users::logout,
        users::me,
        // Books
        books::list_books,
        books::search_books,
        books::get_book,
        books::create_book,
        books::replace_book,
        books::patch_book,
        books::delete_book,
    ),
    components(
        schemas(
            // Users
            crate::models::user::RegisterUser,
            crate::models::user::LoginRequest,
            crate::models::PublicUser,
            users::LoginData,
            super::UserResponse,
            super::LoginResponse,
            // Books
            crate::models::Book,
            crate::models::BookStatus,
            crate::models::BookInput,
            crate::models::BookPatch,
            super::BookResponse,
            // Common
            super::MessageResponse,
            health::StatusResponse,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service status endpoints"),
        (name = "users", description = "Registration and token sessions"),
        (name = "books", description = "Book catalog")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
