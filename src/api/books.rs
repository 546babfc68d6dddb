//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{Book, BookInput, BookPatch, BookSearch},
    AppState,
};

use super::{ApiJson, AuthenticatedUser, BookResponse, DataResponse, MessageResponse};

/// List all books
#[utoipa::path(
    get,
    path = "/libros",
    tag = "books",
    responses(
        (status = 200, description = "All books ordered by title", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Search books by title and/or author
#[utoipa::path(
    get,
    path = "/libros/buscar",
    tag = "books",
    params(BookSearch),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>),
        (status = 400, description = "Neither title nor author given", body = crate::error::ErrorResponse),
        (status = 404, description = "No book matches", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    Query(query): Query<BookSearch>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.search(&query).await?;
    Ok(Json(books))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/libros/{id}",
    tag = "books",
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get(&id).await?;
    Ok(Json(book))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/libros",
    tag = "books",
    security(("bearer_auth" = []), ("auth_token" = [])),
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid input or token", body = crate::error::ErrorResponse),
        (status = 401, description = "No token supplied", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    ApiJson(input): ApiJson<BookInput>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let book = state.services.books.create(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: book })))
}

/// Replace every field of a book
#[utoipa::path(
    put,
    path = "/libros/{id}",
    tag = "books",
    security(("bearer_auth" = []), ("auth_token" = [])),
    params(("id" = String, Path, description = "Book ID")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book replaced", body = Book),
        (status = 400, description = "Invalid input or token", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn replace_book(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<BookInput>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.replace(&id, input).await?;
    Ok(Json(book))
}

/// Update some fields of a book
#[utoipa::path(
    patch,
    path = "/libros/{id}",
    tag = "books",
    security(("bearer_auth" = []), ("auth_token" = [])),
    params(("id" = String, Path, description = "Book ID")),
    request_body = BookPatch,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input or token", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn patch_book(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<BookPatch>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.patch(&id, patch).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/libros/{id}",
    tag = "books",
    security(("bearer_auth" = []), ("auth_token" = [])),
    params(("id" = String, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 401, description = "No token supplied", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    _caller: AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.delete(&id).await?;
    Ok(Json(MessageResponse::new("Book deleted")))
}
