//! Data models for Libreria

pub mod book;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookChanges, BookInput, BookPatch, BookSearch, BookStatus, NewBook};
pub use token::{TokenClaims, TokenRecord, TokenRejection, TokenScheme};
pub use user::{NewUser, PublicUser, User};
