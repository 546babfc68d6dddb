//! Web client integration tests
//!
//! The API runs on an ephemeral port with the in-memory store; the web router is driven
//! in-process and reaches the API over real HTTP.

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

use libreria_server::{
    api,
    config::WebConfig,
    repository::Repository,
    web::{self, WebState},
    AppConfig, AppState,
};

async fn spawn_api() -> String {
    let state = AppState::with_repository(AppConfig::in_memory(), Repository::in_memory());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::create_router(state)).await.unwrap();
    });
    format!("http://{}/endpoint", addr)
}

async fn web_app() -> Router {
    let config = WebConfig {
        api_url: spawn_api().await,
        ..WebConfig::default()
    };
    web::create_router(WebState::new(&config).unwrap())
}

async fn send(router: &Router, method: &str, uri: &str, cookies: &str, form: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if !cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookies);
    }
    let request = match form {
        Some(form) => builder
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.clone().oneshot(request).await.unwrap()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `name=value` pairs set by a response, ready for a Cookie header
fn cookies_from(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::to_string)
        .filter(|pair| !pair.ends_with('='))
        .collect()
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn register_and_login(router: &Router) -> String {
    let response = send(
        router,
        "POST",
        "/login/register",
        "",
        Some("name=Reader+One&email=reader%40example.com&password=secret-password"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = send(
        router,
        "POST",
        "/login/auth",
        "",
        Some("email=reader%40example.com&password=secret-password"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/user");

    let cookies = cookies_from(&response);
    assert!(cookies.iter().any(|c| c.starts_with("user-token=")));
    assert!(cookies.iter().any(|c| c.starts_with("user-data=")));
    cookies.join("; ")
}

#[tokio::test]
async fn test_login_stores_token_cookie_and_redirects() {
    let router = web_app().await;
    let cookies = register_and_login(&router).await;

    let response = send(&router, "GET", "/user", &cookies, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = text(response).await;
    assert!(page.contains("Reader One"));
    assert!(page.contains("reader@example.com"));

    let response = send(&router, "GET", "/", &cookies, None).await;
    assert_eq!(location(&response), "/user");
}

#[tokio::test]
async fn test_bad_login_flashes_error() {
    let router = web_app().await;

    let response = send(
        &router,
        "POST",
        "/login/auth",
        "",
        Some("email=nobody%40example.com&password=secret-password"),
    )
    .await;
    assert_eq!(location(&response), "/");
    let cookies = cookies_from(&response);
    assert!(cookies.iter().any(|c| c.starts_with("flash=")));
    assert!(!cookies.iter().any(|c| c.starts_with("user-token=")));

    let response = send(&router, "GET", "/", &cookies.join("; "), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("Login error"));
}

#[tokio::test]
async fn test_add_book_then_list() {
    let router = web_app().await;
    let cookies = register_and_login(&router).await;

    let response = send(
        &router,
        "POST",
        "/books/add/new",
        &cookies,
        Some("title=El+Quijote&author=Miguel+de+Cervantes&publishedYear=1605&status=available"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/books/list");

    let response = send(&router, "GET", "/books/list", &cookies, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = text(response).await;
    assert!(page.contains("El Quijote"));
    assert!(page.contains("Miguel de Cervantes"));

    let response = send(&router, "GET", "/books/result?title=quijote", "", None).await;
    assert!(text(response).await.contains("El Quijote"));
}

#[tokio::test]
async fn test_invalid_book_returns_to_form() {
    let router = web_app().await;
    let cookies = register_and_login(&router).await;

    let response = send(
        &router,
        "POST",
        "/books/add/new",
        &cookies,
        Some("title=El+Quijote&author=Miguel+de+Cervantes&publishedYear=16a5&status=available"),
    )
    .await;
    assert_eq!(location(&response), "/books/add");
}

#[tokio::test]
async fn test_write_pages_require_login() {
    let router = web_app().await;

    let response = send(&router, "GET", "/books/add", "", None).await;
    assert_eq!(location(&response), "/");

    let response = send(&router, "GET", "/user", "", None).await;
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let router = web_app().await;
    let cookies = register_and_login(&router).await;

    let response = send(&router, "GET", "/logout", &cookies, None).await;
    assert_eq!(location(&response), "/");
    assert!(cookies_from(&response).is_empty());
    let removed: Vec<_> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert!(removed.iter().any(|c| c.starts_with("user-token=")));
}

#[tokio::test]
async fn test_unknown_page_is_404() {
    let router = web_app().await;
    let response = send(&router, "GET", "/no/such/page", "", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(text(response).await.contains("Page not found"));
}
