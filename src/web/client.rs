//! HTTP client for the Libreria REST API

use reqwest::{header::AUTHORIZATION, Response, StatusCode, Url};
use serde::Serialize;
use thiserror::Error;

use crate::{
    api::{users::LoginData, DataResponse, USER_TOKEN_HEADER},
    error::ErrorResponse,
    models::{Book, BookInput, PublicUser},
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("API unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected API response: {0}")]
    Protocol(String),
}

impl ClientError {
    /// HTTP status returned by the API, if it answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for showing to the user
    pub fn message(&self) -> String {
        match self {
            ClientError::Api { message, .. } => message.clone(),
            ClientError::Transport(_) | ClientError::Protocol(_) => {
                "The library service is unavailable".to_string()
            }
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Login {
    pub token: String,
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct Registration<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// `base_url` includes the `/endpoint` prefix
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Protocol(format!("invalid API URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Protocol(format!("invalid API URL {}", base_url)));
        }
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { http, base_url })
    }

    /// API URL for `segments`, each percent-encoded as a single path segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// URL of one book. Dot segments cannot name a book and would climb the path.
    fn book_url(&self, id: &str) -> ClientResult<Url> {
        if id == "." || id == ".." {
            return Err(ClientError::Api {
                status: StatusCode::NOT_FOUND,
                message: "Book not found".to_string(),
            });
        }
        Ok(self.url(&["libros", id]))
    }

    /// Turn non-2xx responses into `ClientError::Api`, reading the API error body
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unexpected error")
                .to_string(),
        };
        tracing::debug!(%status, %message, "API call rejected");
        Err(ClientError::Api { status, message })
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Login> {
        let response = self
            .http
            .post(self.url(&["users", "login"]))
            .json(&Credentials { email, password })
            .send()
            .await?;
        let response = Self::check(response).await?;

        let token = response
            .headers()
            .get(USER_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Protocol("login response carried no token".to_string()))?;
        let body: DataResponse<LoginData> = response.json().await?;

        Ok(Login {
            token,
            name: body.data.name,
            email: body.data.email,
        })
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> ClientResult<PublicUser> {
        let response = self
            .http
            .post(self.url(&["users", "register"]))
            .json(&Registration {
                name,
                email,
                password,
            })
            .send()
            .await?;
        let body: DataResponse<PublicUser> = Self::check(response).await?.json().await?;
        Ok(body.data)
    }

    pub async fn logout(&self, token: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(self.url(&["users", "logout"]))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn list_books(&self) -> ClientResult<Vec<Book>> {
        let response = self.http.get(self.url(&["libros"])).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn search_books(&self, title: Option<&str>, author: Option<&str>) -> ClientResult<Vec<Book>> {
        let response = self
            .http
            .get(self.url(&["libros", "buscar"]))
            .query(&SearchParams { title, author })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn get_book(&self, id: &str) -> ClientResult<Book> {
        let response = self
            .http
            .get(self.book_url(id)?)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn create_book(&self, token: &str, book: &BookInput) -> ClientResult<Book> {
        let response = self
            .http
            .post(self.url(&["libros"]))
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(book)
            .send()
            .await?;
        let body: DataResponse<Book> = Self::check(response).await?.json().await?;
        Ok(body.data)
    }

    pub async fn replace_book(&self, token: &str, id: &str, book: &BookInput) -> ClientResult<Book> {
        let response = self
            .http
            .put(self.book_url(id)?)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(book)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete_book(&self, token: &str, id: &str) -> ClientResult<()> {
        let response = self
            .http
            .delete(self.book_url(id)?)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
