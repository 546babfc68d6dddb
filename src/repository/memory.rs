//! In-memory store used by tests and local demos

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookChanges, NewBook, NewUser, TokenRecord, User},
};

use super::{BookStore, TokenStore, UserStore};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    tokens: Vec<TokenRecord>,
    books: Vec<Book>,
}

/// All three collections behind a single lock; cloning shares the data
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a token row as-is (lets tests seed expired or revoked tokens)
    pub async fn insert_token(&self, record: TokenRecord) {
        self.inner.write().await.tokens.push(record);
    }

    /// Every token row for an email, oldest first
    pub async fn tokens_for(&self, email: &str) -> Vec<TokenRecord> {
        self.inner
            .read()
            .await
            .tokens
            .iter()
            .filter(|t| t.email == email)
            .cloned()
            .collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: &NewUser) -> AppResult<Option<User>> {
        let mut data = self.inner.write().await;
        if data.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Ok(None);
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        data.users.push(created.clone());
        Ok(Some(created))
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn find_active(&self, email: &str) -> AppResult<Option<TokenRecord>> {
        let data = self.inner.read().await;
        Ok(data
            .tokens
            .iter()
            .rev()
            .find(|t| t.active && t.email == email)
            .cloned())
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<TokenRecord>> {
        let data = self.inner.read().await;
        Ok(data.tokens.iter().find(|t| t.token == token).cloned())
    }

    async fn claim_active(&self, email: &str, token: &str) -> AppResult<TokenRecord> {
        let mut data = self.inner.write().await;
        let existing = data
            .tokens
            .iter()
            .rev()
            .find(|t| t.active && t.email == email)
            .or_else(|| data.tokens.iter().find(|t| t.token == token))
            .cloned();
        if let Some(record) = existing {
            return Ok(record);
        }
        let record = TokenRecord::active(email, token);
        data.tokens.push(record.clone());
        Ok(record)
    }

    async fn deactivate(&self, token: &str) -> AppResult<bool> {
        let mut data = self.inner.write().await;
        match data.tokens.iter_mut().find(|t| t.token == token) {
            Some(record) => {
                record.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, token: &str) -> AppResult<bool> {
        let mut data = self.inner.write().await;
        let before = data.tokens.len();
        data.tokens.retain(|t| t.token != token);
        Ok(data.tokens.len() < before)
    }
}

#[async_trait]
impl BookStore for MemoryStore {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let data = self.inner.read().await;
        let mut books = data.books.clone();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn search(&self, title: Option<String>, author: Option<String>) -> AppResult<Vec<Book>> {
        let data = self.inner.read().await;
        let mut books: Vec<Book> = data
            .books
            .iter()
            .filter(|b| title.as_deref().map_or(true, |t| contains_ignore_case(&b.title, t)))
            .filter(|b| author.as_deref().map_or(true, |a| contains_ignore_case(&b.author, a)))
            .cloned()
            .collect();
        books.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(books)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Book>> {
        let data = self.inner.read().await;
        Ok(data.books.iter().find(|b| b.id == id).cloned())
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let now = Utc::now();
        let created = Book {
            id: Uuid::new_v4(),
            title: book.title.clone(),
            author: book.author.clone(),
            published_year: book.published_year.clone(),
            status: book.status,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.books.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &BookChanges) -> AppResult<Option<Book>> {
        let mut data = self.inner.write().await;
        let Some(book) = data.books.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            book.title = title.clone();
        }
        if let Some(author) = &changes.author {
            book.author = author.clone();
        }
        if let Some(year) = &changes.published_year {
            book.published_year = year.clone();
        }
        if let Some(status) = changes.status {
            book.status = status;
        }
        book.updated_at = Utc::now();
        Ok(Some(book.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut data = self.inner.write().await;
        let before = data.books.len();
        data.books.retain(|b| b.id != id);
        Ok(data.books.len() < before)
    }
}
