//! SQL schema definitions and migrations.
//!
//! This module contains the database schema used by SQL backends. The schema
//! is shared between SQLite and Postgres except for the `path` column, which
//! PostgreSQL must compare bytewise (`COLLATE "C"`) for path order to be tree
//! order. SQLite's default `BINARY` collation already does that.
//!
//! # Migration System
//!
//! The migration system uses code-based migrations rather than SQL files to handle
//! dialect differences between SQLite and PostgreSQL. Each migration is a function
//! that receives the backend and can execute database-specific SQL as needed.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`
//! 4. Document what the migration does

use crate::Result;
use crate::backend::errors::BackendError;

use super::{DbKind, SqlxBackend};

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

/// Tables that are identical in both dialects.
const COMMON_TABLES: &[&str] = &[
    // Schema version tracking
    // BIGINT (64-bit) used for portability between SQLite and PostgreSQL
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // One row per tree. Write transactions bump `revision` first, which is
    // what serializes structural writers on the same tree.
    "CREATE TABLE IF NOT EXISTS trees (
        name TEXT PRIMARY KEY NOT NULL,
        revision BIGINT NOT NULL DEFAULT 0
    )",
];

const SQLITE_NODES: &str = "CREATE TABLE IF NOT EXISTS nodes (
        tree_name TEXT NOT NULL,
        id TEXT NOT NULL,
        path TEXT NOT NULL,
        depth BIGINT NOT NULL,
        numchild BIGINT NOT NULL DEFAULT 0,
        kind TEXT NOT NULL,
        data_json TEXT NOT NULL,
        PRIMARY KEY (tree_name, id),
        UNIQUE (tree_name, path)
    )";

const POSTGRES_NODES: &str = "CREATE TABLE IF NOT EXISTS nodes (
        tree_name TEXT NOT NULL,
        id TEXT NOT NULL,
        path TEXT COLLATE \"C\" NOT NULL,
        depth BIGINT NOT NULL,
        numchild BIGINT NOT NULL DEFAULT 0,
        kind TEXT NOT NULL,
        data_json TEXT NOT NULL,
        PRIMARY KEY (tree_name, id),
        UNIQUE (tree_name, path)
    )";

/// SQL statements to create indexes.
///
/// Prefix scans use the `(tree_name, path)` unique index; root-level and
/// depth-filtered listings use the depth index.
pub const CREATE_INDEXES: &[&str] =
    &["CREATE INDEX IF NOT EXISTS idx_nodes_tree_depth ON nodes(tree_name, depth)"];

/// Table creation statements for one dialect, in dependency order.
pub fn create_tables(kind: DbKind) -> Vec<&'static str> {
    let nodes = match kind {
        DbKind::Sqlite => SQLITE_NODES,
        DbKind::Postgres => POSTGRES_NODES,
    };
    COMMON_TABLES.iter().copied().chain([nodes]).collect()
}

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and handles migrations
/// if the schema version has changed.
pub async fn initialize(backend: &SqlxBackend) -> Result<()> {
    let pool = backend.pool();

    for statement in create_tables(backend.kind()) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Schema creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .map_err(|e| BackendError::SqlxError {
            reason: format!("Failed to check schema version: {e}"),
            source: Some(e),
        })?;

    match row {
        None => {
            tracing::info!(version = SCHEMA_VERSION, "Initializing SQL schema");
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .map_err(|e| BackendError::SqlxError {
                    reason: format!("Failed to initialize schema version: {e}"),
                    source: Some(e),
                })?;
        }
        Some((current,)) if current < SCHEMA_VERSION => {
            migrate(backend, current, SCHEMA_VERSION).await?;
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(BackendError::SqlxError {
                reason: format!(
                    "Database schema v{current} is newer than supported v{SCHEMA_VERSION}"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Index creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    Ok(())
}

/// Run migrations sequentially from one schema version to another.
///
/// Migrations are run one at a time, incrementing the version after each.
async fn migrate(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(backend, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(backend.pool())
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Failed to update schema version to {next}: {e}"),
                source: Some(e),
            })?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }

    tracing::info!(from, to, "All migrations completed successfully");
    Ok(())
}

/// Execute a single migration step.
///
/// When incrementing `SCHEMA_VERSION`, add a match arm here:
///
/// ```ignore
/// match from {
///     1 => migrate_v1_to_v2(backend).await,
///     _ => { /* error handling */ }
/// }
/// ```
async fn run_migration(backend: &SqlxBackend, from: i64, to: i64) -> Result<()> {
    // Version 1 is the first schema; nothing migrates into it yet.
    let _ = backend;

    Err(BackendError::SqlxError {
        reason: format!(
            "Unknown migration path: v{from} to v{to}. \
             This likely means SCHEMA_VERSION was incremented without adding a migration."
        ),
        source: None,
    }
    .into())
}
