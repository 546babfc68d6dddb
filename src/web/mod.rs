//! Server-rendered web client for the Libreria API
//!
//! Pages are rendered from embedded templates. Every catalog operation is forwarded to the
//! REST API with the token kept in the `user-token` cookie.

pub mod client;
pub mod handlers;
pub mod session;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::WebConfig;

use client::ApiClient;
use views::Views;

/// State shared by the web client handlers
#[derive(Clone)]
pub struct WebState {
    pub api: ApiClient,
    pub views: Views,
    pub secure_cookies: bool,
}

impl WebState {
    pub fn new(config: &WebConfig) -> anyhow::Result<Self> {
        Ok(Self {
            api: ApiClient::new(&config.api_url)?,
            views: Views::new()?,
            secure_cookies: config.secure_cookies,
        })
    }
}

/// Create the web client router
pub fn create_router(state: WebState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/user", get(handlers::user_page))
        .route("/login/auth", post(handlers::login))
        .route("/login/register", post(handlers::register))
        .route("/logout", get(handlers::logout))
        // Books
        .route("/books/list", get(handlers::books_list))
        .route("/books/search", get(handlers::books_search))
        .route("/books/result", get(handlers::books_result))
        .route("/books/add", get(handlers::books_add_form))
        .route("/books/add/new", post(handlers::books_add))
        .route("/books/edit/:id", get(handlers::books_edit_form))
        .route("/books/edit/result/:id", post(handlers::books_edit))
        .route("/books/delete/:id", get(handlers::books_delete_form))
        .route("/books/delete/result/:id", post(handlers::books_delete))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
