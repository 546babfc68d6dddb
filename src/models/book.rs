//! Book (catalog entry) model and related types.
//!
//! Write requests arrive as loosely typed DTOs ([`BookInput`], [`BookPatch`]) so that every
//! malformed field is reported as a validation error rather than a deserialization failure.
//! Once validated they are turned into the typed [`NewBook`] / [`BookChanges`] consumed by
//! the repository.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("valid year regex"));

/// Availability of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[serde(alias = "disponible")]
    Available,
    #[serde(alias = "reservado")]
    Reserved,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Reserved => "reserved",
        }
    }
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Available
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" | "disponible" => Ok(BookStatus::Available),
            "reserved" | "reservado" => Ok(BookStatus::Reserved),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

// SQLx conversion for BookStatus (stored in a VARCHAR column)
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Book as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// Four-digit year, kept as text
    pub published_year: String,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_published_year(year: &str) -> Result<(), ValidationError> {
    if YEAR_RE.is_match(year) {
        Ok(())
    } else {
        let mut err = ValidationError::new("published_year");
        err.message = Some("publishedYear must be exactly 4 numeric digits".into());
        Err(err)
    }
}

fn validate_status(status: &str) -> Result<(), ValidationError> {
    status.parse::<BookStatus>().map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("status");
        err.message = Some("status must be one of: available, reserved".into());
        err
    })
}

/// Create / full-replace request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[validate(length(min = 6, max = 255, message = "title must be between 6 and 255 characters"))]
    pub title: String,
    #[validate(length(min = 6, max = 255, message = "author must be between 6 and 255 characters"))]
    pub author: String,
    #[serde(alias = "published_year")]
    #[validate(custom(function = "validate_published_year"))]
    pub published_year: String,
    #[validate(custom(function = "validate_status"))]
    pub status: String,
}

impl BookInput {
    /// Validate and convert into the typed insert form
    pub fn into_new_book(self) -> AppResult<NewBook> {
        self.validate()?;
        let status = self.status.parse().map_err(AppError::Validation)?;
        Ok(NewBook {
            title: self.title,
            author: self.author,
            published_year: self.published_year,
            status,
        })
    }
}

/// Partial update request; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    #[validate(length(min = 6, max = 255, message = "title must be between 6 and 255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 6, max = 255, message = "author must be between 6 and 255 characters"))]
    pub author: Option<String>,
    #[serde(alias = "published_year")]
    #[validate(custom(function = "validate_published_year"))]
    pub published_year: Option<String>,
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
}

impl BookPatch {
    /// Validate and convert into typed changes. An empty patch is rejected.
    pub fn into_changes(self) -> AppResult<BookChanges> {
        self.validate()?;
        let status = match self.status {
            Some(s) => Some(s.parse().map_err(AppError::Validation)?),
            None => None,
        };
        let changes = BookChanges {
            title: self.title,
            author: self.author,
            published_year: self.published_year,
            status,
        };
        if changes.is_empty() {
            return Err(AppError::Validation(
                "At least one of title, author, publishedYear or status must be provided".to_string(),
            ));
        }
        Ok(changes)
    }
}

/// Validated book ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub published_year: String,
    pub status: BookStatus,
}

/// Validated set of field changes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub published_year: Option<String>,
    pub status: Option<BookStatus>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.published_year.is_none()
            && self.status.is_none()
    }
}

impl From<NewBook> for BookChanges {
    fn from(book: NewBook) -> Self {
        Self {
            title: Some(book.title),
            author: Some(book.author),
            published_year: Some(book.published_year),
            status: Some(book.status),
        }
    }
}

/// Search parameters for `/libros/buscar`
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookSearch {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the author
    pub author: Option<String>,
}

impl BookSearch {
    /// Non-blank title term
    pub fn title_term(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Non-blank author term
    pub fn author_term(&self) -> Option<&str> {
        self.author.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
