//! SQLite persistence layer for CleanStreet.
//!
//! This crate provides async database operations for accounts (the
//! identity store), complaints, and the read projections behind the
//! dashboards, using SQLx with SQLite.
//!
//! Query functions take any SQLite executor, so callers can run them on
//! the pool or group several into one transaction.
//!
//! # Example
//!
//! ```no_run
//! use database::{account, Database, NewAccount, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:cleanstreet.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let account = account::create_account(
//!         db.pool(),
//!         &NewAccount {
//!             display_name: "Asha".to_string(),
//!             email: "asha@example.com".to_string(),
//!             phone: None,
//!             credential_hash: String::new(),
//!             role: Role::User,
//!             external_identity_ref: None,
//!         },
//!     )
//!     .await?;
//!     println!("created account {}", account.id);
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod complaint;
pub mod error;
pub mod models;
pub mod stats;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Account, AccountSummary, AdminSnapshot, Complaint, ComplaintStatus, ComplaintWithReporter,
    EvidenceRefs, Location, NewAccount, NewComplaint, ReporterCounts, Role, StatusFilter,
    WorkerCounts,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// How long a connection waits on a held write lock before failing.
    const BUSY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/cleanstreet.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Self::BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check that a connection can be acquired and used.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Start a transaction holding the write lock from its first statement.
    ///
    /// Nothing written through the transaction is visible to other
    /// connections until it is committed; dropping it rolls back. A
    /// deferred transaction that reads first fails with `SQLITE_BUSY` when
    /// it later tries to write under contention; this one waits out the
    /// busy timeout up front.
    pub async fn begin_immediate(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = test_db().await;
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_transaction_rollback_discards_writes() {
        let db = test_db().await;

        let mut tx = db.begin_immediate().await.unwrap();
        let created = account::create_account(
            &mut *tx,
            &NewAccount {
                display_name: "Temp".to_string(),
                email: "temp@example.com".to_string(),
                phone: None,
                credential_hash: String::new(),
                role: Role::User,
                external_identity_ref: None,
            },
        )
        .await
        .unwrap();
        tx.rollback().await.unwrap();

        let result = account::get_account(db.pool(), created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_reporter_foreign_key_is_enforced() {
        let db = test_db().await;

        let result = complaint::insert_complaint(
            db.pool(),
            &NewComplaint {
                reporter_id: 77,
                description: "orphan".to_string(),
                before_evidence_ref: String::new(),
                location: None,
            },
        )
        .await;
        assert!(matches!(result, Err(DatabaseError::Sqlx(_))));
    }
}
