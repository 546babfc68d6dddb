//! API integration tests
//!
//! Drive the full router in-process against the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use libreria_server::{
    api,
    error::{AppError, AppResult},
    models::{TokenClaims, TokenRecord},
    repository::{memory::MemoryStore, Repository, TokenStore},
    AppConfig, AppState,
};

struct TestApp {
    router: Router,
    state: AppState,
    store: MemoryStore,
}

fn test_app() -> TestApp {
    let store = MemoryStore::new();
    let repository = Repository::from_stores(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    );
    let state = AppState::with_repository(AppConfig::in_memory(), repository);
    TestApp {
        router: api::create_router(state.clone()),
        state,
        store,
    }
}

/// Which header carries the token on a request
enum Auth<'a> {
    None,
    Bearer(&'a str),
    Header(&'a str),
    Authorization(&'a str),
}

async fn call(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    auth: Auth<'_>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    match auth {
        Auth::None => {}
        Auth::Bearer(token) => builder = builder.header("authorization", format!("Bearer {}", token)),
        Auth::Header(token) => builder = builder.header("auth-token", token),
        Auth::Authorization(value) => builder = builder.header("authorization", value),
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, json)
}

async fn register(router: &Router) {
    let (status, _, _) = call(
        router,
        "POST",
        "/endpoint/users/register",
        Some(json!({
            "name": "Reader One",
            "email": "reader@example.com",
            "password": "secret-password"
        })),
        Auth::None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn login(router: &Router) -> String {
    let (status, headers, body) = call(
        router,
        "POST",
        "/endpoint/users/login",
        Some(json!({ "email": "reader@example.com", "password": "secret-password" })),
        Auth::None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    headers["user-token"].to_str().unwrap().to_string()
}

fn quijote() -> Value {
    json!({
        "title": "El Quijote",
        "author": "Miguel de Cervantes",
        "publishedYear": "1605",
        "status": "available"
    })
}

async fn create_book(router: &Router, token: &str, book: Value) -> Value {
    let (status, _, body) = call(router, "POST", "/endpoint/libros", Some(book), Auth::Bearer(token)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["data"].clone()
}

#[tokio::test]
async fn test_service_status() {
    let app = test_app();
    let (status, headers, body) = call(&app.router, "GET", "/endpoint", None, Auth::None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Operational (200)");
    assert_eq!(headers["x-powered-by"], "Library API");
}

#[tokio::test]
async fn test_health_and_readiness() {
    let app = test_app();
    let (status, _, body) = call(&app.router, "GET", "/endpoint/health", None, Auth::None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _, body) = call(&app.router, "GET", "/endpoint/ready", None, Auth::None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_unknown_route_uses_json_error() {
    let app = test_app();
    let (status, headers, body) = call(&app.router, "GET", "/endpoint/nowhere", None, Auth::None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchItem");
    assert_eq!(headers["x-powered-by"], "Library API");
}

#[tokio::test]
async fn test_register_returns_public_user_and_rejects_duplicate() {
    let app = test_app();
    let payload = json!({
        "name": "Reader One",
        "email": "Reader@Example.com",
        "password": "secret-password"
    });

    let (status, _, body) = call(
        &app.router,
        "POST",
        "/endpoint/users/register",
        Some(payload.clone()),
        Auth::None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["email"], "reader@example.com");
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("password_hash").is_none());

    let (status, _, body) = call(&app.router, "POST", "/endpoint/users/register", Some(payload), Auth::None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already registered");
    assert_eq!(body["code"], 18);
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = test_app();
    let (status, _, body) = call(
        &app.router,
        "POST",
        "/endpoint/users/register",
        Some(json!({ "name": "Ana", "email": "reader@example.com", "password": "secret-password" })),
        Auth::None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn test_login_returns_token_header_and_reuses_it() {
    let app = test_app();
    register(&app.router).await;

    let (status, headers, body) = call(
        &app.router,
        "POST",
        "/endpoint/users/login",
        Some(json!({ "email": "reader@example.com", "password": "secret-password" })),
        Auth::None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Reader One");
    assert_eq!(body["data"]["email"], "reader@example.com");
    assert_eq!(body["data"]["message"], "Welcome Reader One - reader@example.com");

    let first = headers["user-token"].to_str().unwrap().to_string();
    let second = login(&app.router).await;
    assert_eq!(first, second);
    assert_eq!(app.store.tokens_for("reader@example.com").await.len(), 1);
}

#[tokio::test]
async fn test_login_failures_never_issue_tokens() {
    let app = test_app();
    register(&app.router).await;

    let (status, headers, body) = call(
        &app.router,
        "POST",
        "/endpoint/users/login",
        Some(json!({ "email": "reader@example.com", "password": "wrong-password" })),
        Auth::None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers.get("user-token").is_none());
    assert_eq!(body["error"], "NotAuthorized");

    let (status, headers, body) = call(
        &app.router,
        "POST",
        "/endpoint/users/login",
        Some(json!({ "email": "nobody@example.com", "password": "secret-password" })),
        Auth::None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(headers.get("user-token").is_none());
    assert_eq!(body["message"], "User not found");

    assert!(app.store.tokens_for("reader@example.com").await.is_empty());
}

#[tokio::test]
async fn test_me_accepts_both_token_headers() {
    let app = test_app();
    register(&app.router).await;
    let token = login(&app.router).await;

    for auth in [Auth::Bearer(&token), Auth::Header(&token)] {
        let (status, _, body) = call(&app.router, "GET", "/endpoint/users/me", None, auth).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "reader@example.com");
    }
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = test_app();
    let (status, _, body) = call(&app.router, "POST", "/endpoint/libros", Some(quijote()), Auth::None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 30);

    let (status, _, _) = call(
        &app.router,
        "DELETE",
        &format!("/endpoint/libros/{}", Uuid::new_v4()),
        None,
        Auth::None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_token_names_the_scheme() {
    let app = test_app();
    let (status, _, body) = call(
        &app.router,
        "POST",
        "/endpoint/libros",
        Some(quijote()),
        Auth::Bearer("made-up-token"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Bearer token is not valid");

    let (_, _, body) = call(
        &app.router,
        "POST",
        "/endpoint/libros",
        Some(quijote()),
        Auth::Header("made-up-token"),
    )
    .await;
    assert_eq!(body["message"], "auth-token is not valid");
}

#[tokio::test]
async fn test_non_bearer_authorization_is_invalid_token() {
    let app = test_app();
    register(&app.router).await;
    let token = login(&app.router).await;

    let basic = format!("Basic {}", token);
    let (status, _, body) = call(
        &app.router,
        "POST",
        "/endpoint/libros",
        Some(quijote()),
        Auth::Authorization(&basic),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Bearer token is not valid"));
}

#[tokio::test]
async fn test_logout_revokes_token_and_next_login_mints_new_one() {
    let app = test_app();
    register(&app.router).await;
    let token = login(&app.router).await;

    let (status, _, body) = call(&app.router, "POST", "/endpoint/users/logout", None, Auth::Bearer(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");

    let (status, _, body) = call(&app.router, "POST", "/endpoint/libros", Some(quijote()), Auth::Bearer(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Bearer token revoked");
    assert_eq!(body["code"], 32);

    let fresh = login(&app.router).await;
    assert_ne!(fresh, token);
    create_book(&app.router, &fresh, quijote()).await;
}

#[tokio::test]
async fn test_expired_token_is_rejected_and_replaced_at_login() {
    let app = test_app();
    register(&app.router).await;

    let user = app
        .state
        .services
        .auth
        .login(libreria_server::models::user::LoginRequest {
            email: "reader@example.com".into(),
            password: "secret-password".into(),
        })
        .await
        .unwrap()
        .1;
    // Replace the freshly issued token with an expired one
    let issued = app.store.tokens_for(&user.email).await;
    for record in &issued {
        app.store.delete(&record.token).await.unwrap();
    }
    let past = Utc::now() - Duration::hours(1);
    let expired = app
        .state
        .services
        .auth
        .keys()
        .sign_claims(&TokenClaims {
            id: user.id,
            email: user.email.clone(),
            jti: Uuid::new_v4(),
            iat: (past - Duration::hours(24)).timestamp(),
            exp: past.timestamp(),
        })
        .unwrap();
    app.store
        .insert_token(TokenRecord::active(&user.email, &expired))
        .await;

    let (status, _, body) = call(&app.router, "POST", "/endpoint/libros", Some(quijote()), Auth::Header(&expired)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "auth-token expired");
    assert_eq!(body["code"], 33);

    let fresh = login(&app.router).await;
    assert_ne!(fresh, expired);
    let rows = app.store.tokens_for(&user.email).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].token, fresh);
}

#[tokio::test]
async fn test_book_validation() {
    let app = test_app();
    register(&app.router).await;
    let token = login(&app.router).await;

    let mut bad_year = quijote();
    bad_year["publishedYear"] = json!("16a5");
    let (status, _, body) = call(&app.router, "POST", "/endpoint/libros", Some(bad_year), Auth::Bearer(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let mut bad_status = quijote();
    bad_status["status"] = json!("missing");
    let (status, _, _) = call(&app.router, "POST", "/endpoint/libros", Some(bad_status), Auth::Bearer(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = call(&app.router, "GET", "/endpoint/libros", None, Auth::None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_malformed_json_yields_json_error() {
    let app = test_app();
    register(&app.router).await;
    let token = login(&app.router).await;

    let request = Request::builder()
        .method("POST")
        .uri("/endpoint/libros")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from("{\"title\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 18);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_book_crud_flow() {
    let app = test_app();
    register(&app.router).await;
    let token = login(&app.router).await;

    let created = create_book(&app.router, &token, quijote()).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["publishedYear"], "1605");
    assert_eq!(created["status"], "available");

    let (status, _, body) = call(&app.router, "GET", &format!("/endpoint/libros/{}", id), None, Auth::None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "El Quijote");

    let (status, _, body) = call(
        &app.router,
        "PUT",
        &format!("/endpoint/libros/{}", id),
        Some(json!({
            "title": "Don Quijote de la Mancha",
            "author": "Miguel de Cervantes",
            "publishedYear": "1615",
            "status": "reservado"
        })),
        Auth::Header(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["publishedYear"], "1615");
    assert_eq!(body["status"], "reserved");

    let (status, _, body) = call(
        &app.router,
        "PATCH",
        &format!("/endpoint/libros/{}", id),
        Some(json!({ "status": "available" })),
        Auth::Bearer(&token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "available");
    assert_eq!(body["title"], "Don Quijote de la Mancha");

    let (status, _, _) = call(
        &app.router,
        "PATCH",
        &format!("/endpoint/libros/{}", id),
        Some(json!({})),
        Auth::Bearer(&token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = call(&app.router, "DELETE", &format!("/endpoint/libros/{}", id), None, Auth::Bearer(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book deleted");

    let (status, _, _) = call(&app.router, "DELETE", &format!("/endpoint/libros/{}", id), None, Auth::Bearer(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = call(&app.router, "GET", "/endpoint/libros/not-a-uuid", None, Auth::None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search() {
    let app = test_app();
    register(&app.router).await;
    let token = login(&app.router).await;
    create_book(&app.router, &token, quijote()).await;
    create_book(
        &app.router,
        &token,
        json!({
            "title": "Ficciones",
            "author": "Jorge Luis Borges",
            "publishedYear": "1944",
            "status": "reserved"
        }),
    )
    .await;

    let (status, _, _) = call(&app.router, "GET", "/endpoint/libros/buscar", None, Auth::None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = call(&app.router, "GET", "/endpoint/libros/buscar?title=quijote", None, Auth::None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "El Quijote");

    let (status, _, body) = call(&app.router, "GET", "/endpoint/libros/buscar?author=BORGES", None, Auth::None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["author"], "Jorge Luis Borges");

    let (status, _, _) = call(&app.router, "GET", "/endpoint/libros/buscar?title=quijote&author=borges", None, Auth::None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, _, body) = call(&app.router, "GET", "/endpoint/libros", None, Auth::None).await;
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["El Quijote", "Ficciones"]);
}

#[tokio::test]
async fn test_cors_exposes_token_header() {
    let app = test_app();
    let request = Request::builder()
        .method("GET")
        .uri("/endpoint")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let exposed = response.headers()["access-control-expose-headers"].to_str().unwrap();
    assert!(exposed.contains("user-token"));
}

/// Token store whose every call fails
struct BrokenTokenStore;

#[async_trait]
impl TokenStore for BrokenTokenStore {
    async fn find_active(&self, _email: &str) -> AppResult<Option<TokenRecord>> {
        Err(AppError::Internal("token store offline".into()))
    }

    async fn find_by_token(&self, _token: &str) -> AppResult<Option<TokenRecord>> {
        Err(AppError::Internal("token store offline".into()))
    }

    async fn claim_active(&self, _email: &str, _token: &str) -> AppResult<TokenRecord> {
        Err(AppError::Internal("token store offline".into()))
    }

    async fn deactivate(&self, _token: &str) -> AppResult<bool> {
        Err(AppError::Internal("token store offline".into()))
    }

    async fn delete(&self, _token: &str) -> AppResult<bool> {
        Err(AppError::Internal("token store offline".into()))
    }
}

#[tokio::test]
async fn test_token_store_failure_is_internal_error() {
    let store = MemoryStore::new();
    let repository = Repository::from_stores(
        Arc::new(store.clone()),
        Arc::new(BrokenTokenStore),
        Arc::new(store),
    );
    let router = api::create_router(AppState::with_repository(AppConfig::in_memory(), repository));

    let (status, _, body) = call(&router, "POST", "/endpoint/libros", Some(quijote()), Auth::Bearer("any-token")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
}
