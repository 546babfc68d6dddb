//! Page handlers for the web client

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use minijinja::context;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{BookInput, BookSearch};

use super::{
    client::ClientError,
    session::{self, Flash, UserData},
    WebState,
};

const TITLE: &str = "Libreria";

#[derive(Debug, Error)]
pub enum WebError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>500</h1><p>Internal server error</p>"),
        )
            .into_response()
    }
}

type WebResult = Result<Response, WebError>;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

fn flash_redirect(state: &WebState, jar: CookieJar, flash: Flash, to: &str) -> Response {
    (session::set_flash(jar, &flash, state.secure_cookies), Redirect::to(to)).into_response()
}

fn describe(error: &ClientError) -> String {
    if error.status().is_none() {
        tracing::warn!("API call failed: {}", error);
    }
    error.message()
}

/// Start page: login and registration forms
pub async fn index(State(state): State<WebState>, jar: CookieJar) -> WebResult {
    if session::current_user(&jar).is_some() {
        return Ok(Redirect::to("/user").into_response());
    }
    let (jar, flash) = session::take_flash(jar);
    let page = state.views.render("index.html", context! { title => TITLE, flash => flash })?;
    Ok((jar, Html(page)).into_response())
}

pub async fn user_page(State(state): State<WebState>, jar: CookieJar) -> WebResult {
    let Some((_, user)) = session::current_user(&jar) else {
        return Ok(Redirect::to("/").into_response());
    };
    let (jar, flash) = session::take_flash(jar);
    let page = state
        .views
        .render("user.html", context! { title => TITLE, user => user, flash => flash })?;
    Ok((jar, Html(page)).into_response())
}

pub async fn login(
    State(state): State<WebState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.api.login(&form.email, &form.password).await {
        Ok(login) => {
            let user = UserData {
                name: login.name,
                email: login.email,
            };
            tracing::info!(email = %user.email, "Web login");
            let jar = session::sign_in(jar, login.token, &user, state.secure_cookies);
            (jar, Redirect::to("/user")).into_response()
        }
        Err(e) if e.status() == Some(StatusCode::BAD_REQUEST) => flash_redirect(
            &state,
            jar,
            Flash::error(
                "Login error",
                "Incorrect login data. Please check your email and password.",
            ),
            "/",
        ),
        Err(e) => {
            tracing::error!("Login failed: {}", e);
            flash_redirect(
                &state,
                jar,
                Flash::error("Server error", "Internal server error. Please try again later."),
                "/",
            )
        }
    }
}

pub async fn register(
    State(state): State<WebState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let flash = match state
        .api
        .register(&form.name, &form.email, &form.password)
        .await
    {
        Ok(_) => Flash::success("Registration complete", "Your account has been created. You can now log in."),
        Err(e) => Flash::error("Registration error", format!("Registration failed: {}", describe(&e))),
    };
    flash_redirect(&state, jar, flash, "/")
}

/// Revoke the token (best effort) and drop the session cookies
pub async fn logout(State(state): State<WebState>, jar: CookieJar) -> Response {
    if let Some(token) = session::token(&jar) {
        if let Err(e) = state.api.logout(&token).await {
            tracing::warn!("Token revocation failed during logout: {}", e);
        }
    }
    (session::sign_out(jar), Redirect::to("/")).into_response()
}

pub async fn books_list(State(state): State<WebState>, jar: CookieJar) -> WebResult {
    let user = session::current_user(&jar).map(|(_, user)| user);
    match state.api.list_books().await {
        Ok(books) => {
            let (jar, flash) = session::take_flash(jar);
            let page = state
                .views
                .render("books/list.html", context! { title => TITLE, user => user, flash => flash, books => books })?;
            Ok((jar, Html(page)).into_response())
        }
        Err(e) => Ok(flash_redirect(
            &state,
            jar,
            Flash::error("Could not load books", describe(&e)),
            "/",
        )),
    }
}

pub async fn books_search(State(state): State<WebState>, jar: CookieJar) -> WebResult {
    let user = session::current_user(&jar).map(|(_, user)| user);
    let page = state
        .views
        .render("books/search.html", context! { title => TITLE, user => user })?;
    Ok(Html(page).into_response())
}

pub async fn books_result(
    State(state): State<WebState>,
    jar: CookieJar,
    Query(query): Query<BookSearch>,
) -> WebResult {
    let user = session::current_user(&jar).map(|(_, user)| user);
    let (books, error) = match state
        .api
        .search_books(query.title_term(), query.author_term())
        .await
    {
        Ok(books) => (books, None),
        Err(e) => (Vec::new(), Some(describe(&e))),
    };
    let page = state
        .views
        .render("books/result.html", context! { title => TITLE, user => user, books => books, error => error })?;
    Ok(Html(page).into_response())
}

pub async fn books_add_form(State(state): State<WebState>, jar: CookieJar) -> WebResult {
    let Some((_, user)) = session::current_user(&jar) else {
        return Ok(Redirect::to("/").into_response());
    };
    let (jar, flash) = session::take_flash(jar);
    let page = state
        .views
        .render("books/add.html", context! { title => TITLE, user => user, flash => flash })?;
    Ok((jar, Html(page)).into_response())
}

pub async fn books_add(
    State(state): State<WebState>,
    jar: CookieJar,
    Form(book): Form<BookInput>,
) -> Response {
    let Some(token) = session::token(&jar) else {
        return Redirect::to("/").into_response();
    };
    match state.api.create_book(&token, &book).await {
        Ok(created) => flash_redirect(
            &state,
            jar,
            Flash::success("Book added", format!("\"{}\" has been added.", created.title)),
            "/books/list",
        ),
        Err(e) => flash_redirect(
            &state,
            jar,
            Flash::error("Could not add the book", describe(&e)),
            "/books/add",
        ),
    }
}

async fn book_form(state: &WebState, jar: CookieJar, id: &str, template: &str) -> WebResult {
    let Some((_, user)) = session::current_user(&jar) else {
        return Ok(Redirect::to("/").into_response());
    };
    match state.api.get_book(id).await {
        Ok(book) => {
            let (jar, flash) = session::take_flash(jar);
            let page = state
                .views
                .render(template, context! { title => TITLE, user => user, flash => flash, book => book })?;
            Ok((jar, Html(page)).into_response())
        }
        Err(e) => Ok(flash_redirect(
            state,
            jar,
            Flash::error("Could not load the book", describe(&e)),
            "/books/list",
        )),
    }
}

pub async fn books_edit_form(
    State(state): State<WebState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> WebResult {
    book_form(&state, jar, &id, "books/edit.html").await
}

pub async fn books_edit(
    State(state): State<WebState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(book): Form<BookInput>,
) -> Response {
    let Some(token) = session::token(&jar) else {
        return Redirect::to("/").into_response();
    };
    match state.api.replace_book(&token, &id, &book).await {
        Ok(updated) => flash_redirect(
            &state,
            jar,
            Flash::success("Book updated", format!("\"{}\" has been updated.", updated.title)),
            "/books/list",
        ),
        Err(e) => flash_redirect(
            &state,
            jar,
            Flash::error("Could not update the book", describe(&e)),
            &format!("/books/edit/{}", id),
        ),
    }
}

pub async fn books_delete_form(
    State(state): State<WebState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> WebResult {
    book_form(&state, jar, &id, "books/remove.html").await
}

pub async fn books_delete(
    State(state): State<WebState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let Some(token) = session::token(&jar) else {
        return Redirect::to("/").into_response();
    };
    let flash = match state.api.delete_book(&token, &id).await {
        Ok(()) => Flash::success("Book deleted", "The book has been removed from the catalog."),
        Err(e) => Flash::error("Could not delete the book", describe(&e)),
    };
    flash_redirect(&state, jar, flash, "/books/list")
}

/// Fallback for unknown paths
pub async fn not_found(State(state): State<WebState>, jar: CookieJar) -> WebResult {
    let user = session::current_user(&jar).map(|(_, user)| user);
    let page = state.views.render(
        "error.html",
        context! { title => TITLE, user => user, status => 404, message => "Page not found" },
    )?;
    Ok((StatusCode::NOT_FOUND, Html(page)).into_response())
}
