//! # Local Database Module
//!
//! Local SQLite storage for the last successfully fetched club data. It is a
//! read fallback only: the reconciler writes a snapshot after every live fetch
//! and reads it back when the backend cannot be reached.
//!
//! ## Key Components
//!
//! - `LocalDatabase`: connection pool and schema management
//! - `schema.rs`: table definitions and migration bookkeeping
//! - `snapshots.rs`: per-user club and membership snapshots
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clubhub::app::local_db::LocalDatabase;
//! use clubhub::shared::UserId;
//!
//! # async fn example() -> Result<(), sqlx::Error> {
//! let db = LocalDatabase::open("/tmp/clubhub.db").await?;
//! let snapshot = db.load_club_snapshot(&UserId::new("u-42")).await?;
//! # Ok(())
//! # }
//! ```

pub mod schema;
pub mod snapshots;

pub use snapshots::Snapshot;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Result as SqlxResult, SqlitePool};
use std::path::Path;

/// Result type for local database operations
pub type Result<T> = SqlxResult<T>;

/// Local database connection manager
#[derive(Debug, Clone)]
pub struct LocalDatabase {
    pool: SqlitePool,
}

impl LocalDatabase {
    /// Open or create the database at `path`
    ///
    /// Creates the file and its directory if needed and initializes the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;

        let db = Self { pool };
        db.init_schema().await?;
        tracing::debug!("[CACHE] opened snapshot database at {}", path.display());
        Ok(db)
    }

    /// Private in-memory database, used by tests and when no disk is available
    pub async fn in_memory() -> Result<Self> {
        // A memory database lives and dies with its connection, so keep one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = Self { pool };
        db.init_schema().await?;
        Ok(db)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        for statement in schema::CREATE_TABLES {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.run_migrations().await
    }

    /// Apply any migration newer than the recorded schema version
    async fn run_migrations(&self) -> Result<()> {
        let recorded = self.schema_version().await?;
        if !schema::needs_migration(recorded) {
            return Ok(());
        }

        for migration in schema::get_pending_migrations(recorded) {
            let mut tx = self.pool.begin().await?;
            for statement in migration.statements {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(migration.version)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            tracing::info!("[CACHE] applied schema migration v{}", migration.version);
        }
        Ok(())
    }

    async fn schema_version(&self) -> Result<i32> {
        let version: (i32,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await?;
        Ok(version.0)
    }

    /// Get connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get database statistics
    pub async fn get_stats(&self) -> Result<DatabaseStats> {
        let club_snapshots: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM club_snapshots")
            .fetch_one(&self.pool)
            .await?;
        let membership_snapshots: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM membership_snapshots")
                .fetch_one(&self.pool)
                .await?;
        Ok(DatabaseStats {
            club_snapshots: club_snapshots.0 as u64,
            membership_snapshots: membership_snapshots.0 as u64,
            schema_version: self.schema_version().await?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Users with a cached club list
    pub club_snapshots: u64,
    /// Users with a cached membership list
    pub membership_snapshots: u64,
    pub schema_version: i32,
}
