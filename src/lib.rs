//! Libreria library catalog
//!
//! A REST JSON API for a small book catalog with token-based sessions, and a
//! server-rendered web client that talks to it over HTTP.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use config::StorageBackend;
use repository::Repository;
use services::Services;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    /// Build the state on top of an already assembled repository
    pub fn with_repository(config: AppConfig, repository: Repository) -> Self {
        let services = Services::new(repository, &config.auth);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }

    /// Connect the configured store (running migrations for PostgreSQL) and build the state
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let repository = match config.database.backend {
            StorageBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .connect(&config.database.url)
                    .await
                    .context("connect to database")?;
                tracing::info!("Connected to database");

                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("run database migrations")?;
                tracing::info!("Database migrations completed");

                Repository::new(pool)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Repository::in_memory()
            }
        };

        Ok(Self::with_repository(config, repository))
    }
}
