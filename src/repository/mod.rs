//! Repository layer for database operations.
//!
//! Each collection (users, tokens, books) is reached through a store trait so the
//! services run unchanged on PostgreSQL or on the in-memory backend.

pub mod books;
pub mod memory;
pub mod tokens;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookChanges, NewBook, NewUser, TokenRecord, User},
};

/// Credential store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by (normalized) email
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by id
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Insert a user; `Ok(None)` when the email is already taken
    async fn create(&self, user: &NewUser) -> AppResult<Option<User>>;
}

/// Issued token store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// The active token row for an email, if any
    async fn find_active(&self, email: &str) -> AppResult<Option<TokenRecord>>;

    /// Any row holding exactly this token string
    async fn find_by_token(&self, token: &str) -> AppResult<Option<TokenRecord>>;

    /// Store `token` as the active token for `email` unless an active row for that email,
    /// or a row with that token string, already exists. Returns the row that is in effect
    /// afterwards, which is the pre-existing one when the insert was skipped.
    async fn claim_active(&self, email: &str, token: &str) -> AppResult<TokenRecord>;

    /// Mark a token inactive; returns false when no such token exists
    async fn deactivate(&self, token: &str) -> AppResult<bool>;

    /// Delete a token row; returns false when no such token exists
    async fn delete(&self, token: &str) -> AppResult<bool>;
}

/// Book catalog store
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books ordered by title
    async fn list(&self) -> AppResult<Vec<Book>>;

    /// Case-insensitive substring match on title and/or author (both must match when given)
    async fn search(&self, title: Option<String>, author: Option<String>) -> AppResult<Vec<Book>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Book>>;

    async fn create(&self, book: &NewBook) -> AppResult<Book>;

    /// Apply changes; `Ok(None)` when the book does not exist
    async fn update(&self, id: Uuid, changes: &BookChanges) -> AppResult<Option<Book>>;

    /// Delete a book; returns false when it did not exist
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

/// Main repository struct holding one store per collection
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub books: Arc<dyn BookStore>,
    pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a repository backed by the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::UsersRepository::new(pool.clone())),
            tokens: Arc::new(tokens::TokensRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Create a repository backed by process memory
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            tokens: Arc::new(store.clone()),
            books: Arc::new(store),
            pool: None,
        }
    }

    /// Assemble a repository from arbitrary stores
    pub fn from_stores(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        books: Arc<dyn BookStore>,
    ) -> Self {
        Self {
            users,
            tokens,
            books,
            pool: None,
        }
    }

    /// Check database connectivity (always succeeds for non-database stores)
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}
