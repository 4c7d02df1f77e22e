//! Database Schema Definitions
//!
//! Contains the snapshot tables and schema-related constants.

/// Current database schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Bookkeeping table, created before any migration runs
pub const CREATE_TABLES: &[&str] = &["CREATE TABLE IF NOT EXISTS schema_migrations (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL
    )"];

/// One schema step, applied in a single transaction
#[derive(Debug)]
pub struct Migration {
    pub version: i32,
    pub statements: &'static [&'static str],
}

/// All migrations in version order
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[
        "CREATE TABLE IF NOT EXISTS club_snapshots (
            user_id TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS membership_snapshots (
            user_id TEXT PRIMARY KEY,
            payload TEXT NOT NULL,
            fetched_at TEXT NOT NULL
        )",
    ],
}];

/// Whether a database at `recorded_version` is behind this build
pub fn needs_migration(recorded_version: i32) -> bool {
    recorded_version < CURRENT_SCHEMA_VERSION
}

/// Migrations newer than `recorded_version`, oldest first
pub fn get_pending_migrations(recorded_version: i32) -> Vec<&'static Migration> {
    MIGRATIONS
        .iter()
        .filter(|m| m.version > recorded_version)
        .collect()
}
