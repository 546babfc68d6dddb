//! Book catalog service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookChanges, BookInput, BookPatch, BookSearch},
    repository::Repository,
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

fn not_found() -> AppError {
    AppError::NotFound("Book not found".to_string())
}

/// Ids that are not UUIDs cannot name a stored book
fn parse_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| not_found())
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// All books ordered by title
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Case-insensitive substring search. At least one term is required and an empty
    /// result is reported as not found.
    pub async fn search(&self, query: &BookSearch) -> AppResult<Vec<Book>> {
        let title = query.title_term().map(str::to_string);
        let author = query.author_term().map(str::to_string);

        if title.is_none() && author.is_none() {
            return Err(AppError::Validation(
                "Provide a title or an author to search".to_string(),
            ));
        }

        let books = self.repository.books.search(title, author).await?;
        if books.is_empty() {
            return Err(AppError::NotFound("No books match the search".to_string()));
        }
        Ok(books)
    }

    pub async fn get(&self, id: &str) -> AppResult<Book> {
        let id = parse_id(id)?;
        self.repository.books.get(id).await?.ok_or_else(not_found)
    }

    pub async fn create(&self, input: BookInput) -> AppResult<Book> {
        let new_book = input.into_new_book()?;
        let book = self.repository.books.create(&new_book).await?;
        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Full replacement, validated like a create
    pub async fn replace(&self, id: &str, input: BookInput) -> AppResult<Book> {
        let id = parse_id(id)?;
        let changes: BookChanges = input.into_new_book()?.into();
        let book = self
            .repository
            .books
            .update(id, &changes)
            .await?
            .ok_or_else(not_found)?;
        tracing::info!(book_id = %book.id, "Book replaced");
        Ok(book)
    }

    /// Partial update; only the present fields are validated and written
    pub async fn patch(&self, id: &str, patch: BookPatch) -> AppResult<Book> {
        let id = parse_id(id)?;
        let changes = patch.into_changes()?;
        let book = self
            .repository
            .books
            .update(id, &changes)
            .await?
            .ok_or_else(not_found)?;
        tracing::info!(book_id = %book.id, "Book updated");
        Ok(book)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let id = parse_id(id)?;
        if !self.repository.books.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}
