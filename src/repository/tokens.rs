//! Tokens repository for database operations

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::token::TokenRecord,
};

use super::TokenStore;

#[derive(Clone)]
pub struct TokensRepository {
    pool: Pool<Postgres>,
}

impl TokensRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for TokensRepository {
    async fn find_active(&self, email: &str) -> AppResult<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT id, email, token, active, issued_at
            FROM tokens
            WHERE email = $1 AND active
            ORDER BY issued_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_token(&self, token: &str) -> AppResult<Option<TokenRecord>> {
        let record = sqlx::query_as::<_, TokenRecord>(
            "SELECT id, email, token, active, issued_at FROM tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn claim_active(&self, email: &str, token: &str) -> AppResult<TokenRecord> {
        // Both the unique token column and the partial unique index on (email) WHERE active
        // make a conflicting insert a no-op.
        let inserted = sqlx::query_as::<_, TokenRecord>(
            r#"
            INSERT INTO tokens (id, email, token, active, issued_at)
            VALUES ($1, $2, $3, TRUE, $4)
            ON CONFLICT DO NOTHING
            RETURNING id, email, token, active, issued_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(record) = inserted {
            return Ok(record);
        }

        sqlx::query_as::<_, TokenRecord>(
            r#"
            SELECT id, email, token, active, issued_at
            FROM tokens
            WHERE (email = $1 AND active) OR token = $2
            ORDER BY active DESC, issued_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(token)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!("token claim for {} conflicted but no row was found", email))
        })
    }

    async fn deactivate(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE tokens SET active = FALSE WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, token: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
