//! # Application State
//!
//! This module defines the shared state that's accessible to all request handlers
//! and middleware stages.
//!
//! ## The State Pattern
//! Instead of creating new database connections for each request, we:
//! 1. Create a connection pool once at startup
//! 2. Store it in AppState
//! 3. Share it across all request handlers
//! 4. Axum clones the state for each request (cheap because we use Arc)

use crate::config::Config;
use crate::views::Views;
use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

/// Shared application state
///
/// Holds process-wide resources only; everything request-scoped lives in
/// request extensions.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,

    /// Template environment used for every rendered page
    pub views: Views,

    /// Configuration loaded at startup
    pub config: Arc<Config>,
}

impl AppState {
    /// Initialize application state
    ///
    /// This function:
    /// 1. Connects to the SQLite database
    /// 2. Runs database migrations (creates tables if they don't exist)
    /// 3. Loads the templates
    ///
    /// # Errors
    /// Returns an error if:
    /// - Database connection fails
    /// - Migrations fail
    pub async fn new(config: Config) -> Result<Self> {
        let db = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&config.database_url)
            .await?;

        Self::with_pool(config, db).await
    }

    /// Build state around an existing pool.
    pub async fn with_pool(config: Config, db: SqlitePool) -> Result<Self> {
        // The `sqlx::migrate!` macro embeds migrations from ./migrations directory
        sqlx::migrate!("./migrations").run(&db).await?;

        let views = Views::new(&config.views_dir);

        Ok(AppState {
            db,
            views,
            config: Arc::new(config),
        })
    }
}
