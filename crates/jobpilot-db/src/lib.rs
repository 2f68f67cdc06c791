//! JobPilot Database Layer
//!
//! `SQLite` persistence for discovered jobs, blacklists, session cookies and
//! delivery attempts. Uses `SQLx` with embedded, versioned migrations.
//!
//! # Example
//!
//! ```ignore
//! use jobpilot_db::Database;
//!
//! let db = Database::open("jobpilot.db").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod blacklists;
pub mod configs;
pub mod error;
pub mod jobs;
pub mod migrations;
pub mod sessions;

pub use error::{DatabaseError, Result};
pub use jobs::DeliveryStats;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// High-level database handle.
///
/// Wraps a `SQLx` connection pool and runs migrations on open. The pool is
/// Arc-based, so `Database` is cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) the database at `path` and apply pending migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError` if the file cannot be opened or a migration
    /// fails.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            DatabaseError::Open("invalid database path: not valid UTF-8".to_string())
        })?;

        let connect_options = SqliteConnectOptions::from_str(path_str)
            .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .map_err(|e| DatabaseError::Open(format!("failed to create pool: {e}")))?;

        migrations::run_migrations(&pool).await?;

        tracing::info!("Database opened at {}", path_str);
        Ok(Self { pool })
    }

    /// Open a fresh in-memory database with migrations applied.
    ///
    /// # Errors
    /// Returns `DatabaseError` if pool creation or a migration fails.
    pub async fn in_memory() -> Result<Self> {
        Self::open(":memory:").await
    }

    /// The underlying `SQLx` pool, for the per-table query modules.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = Database::in_memory().await.expect("create database");
        let version = migrations::get_schema_version(db.pool())
            .await
            .expect("get version");
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn test_open_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("jobpilot.db");

        let db = Database::open(&path).await.expect("open database");
        db.close().await;

        assert!(path.exists());
    }
}
