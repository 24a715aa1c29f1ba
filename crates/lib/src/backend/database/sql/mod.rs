//! SQLite and PostgreSQL storage for trees.
//!
//! Two tables hold everything: `trees` has one row per tree name with its
//! revision counter, and `nodes` has one row per node keyed by
//! `(tree_name, path)`. Both dialects go through one `AnyPool`.
//!
//! Writers serialize per tree: a write transaction starts by bumping the
//! tree's revision, which takes that row's lock until commit. PostgreSQL
//! readers run at REPEATABLE READ so a lookup followed by a path scan sees
//! one snapshot; SQLite readers get that from the deferred transaction.
//!
//! The tables are created on connect by [`schema::initialize`]; the
//! statements differ slightly per dialect, so they live in code.

mod storage;

/// Schema definition and migration system.
pub mod schema;

use std::any::Any;
#[cfg(feature = "postgres")]
use std::time::Duration;

use async_trait::async_trait;
use sqlx::AnyPool;
use sqlx::Executor;
use sqlx::any::AnyPoolOptions;

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{BackendImpl, TreeTxn, TxnMode};

use storage::SqlTxn;

/// SQLite primary and extended result codes for busy/locked databases.
const SQLITE_LOCK_CODES: &[&str] = &["5", "6", "261", "262", "517"];

/// PostgreSQL SQLSTATEs for serialization failure, deadlock and lock timeout.
const POSTGRES_LOCK_CODES: &[&str] = &["40001", "40P01", "55P03"];

/// Maps sqlx errors onto [`BackendError`] with a context message.
///
/// Busy databases, lock timeouts and serialization failures surface as
/// [`BackendError::Conflict`] so callers can retry. Duplicate paths or ids
/// become [`BackendError::UniqueViolation`].
pub(crate) trait SqlxResultExt<T> {
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| classify(context, e).into())
    }
}

fn classify(context: &str, e: sqlx::Error) -> BackendError {
    match &e {
        sqlx::Error::PoolTimedOut => BackendError::Conflict {
            reason: format!("{context}: {e}"),
        },
        sqlx::Error::Database(db) => {
            if db.is_unique_violation() {
                return BackendError::UniqueViolation {
                    reason: format!("{context}: {db}"),
                };
            }
            let locked = db.code().is_some_and(|code| {
                SQLITE_LOCK_CODES
                    .iter()
                    .chain(POSTGRES_LOCK_CODES)
                    .any(|known| *known == code)
            });
            if locked {
                BackendError::Conflict {
                    reason: format!("{context}: {db}"),
                }
            } else {
                BackendError::SqlxError {
                    reason: format!("{context}: {e}"),
                    source: Some(e),
                }
            }
        }
        _ => BackendError::SqlxError {
            reason: format!("{context}: {e}"),
            source: Some(e),
        },
    }
}

/// Which SQL dialect a [`SqlxBackend`] speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

/// Tree storage in a SQL database.
///
/// Any number of trees share the `nodes` table, separated by `tree_name`.
/// Cloning is not needed: wrap it in an `Arc` and hand it to every
/// [`TreeStore`](crate::TreeStore) that should see the same data.
#[derive(Debug)]
pub struct SqlxBackend {
    pool: AnyPool,
    kind: DbKind,
}

impl SqlxBackend {
    /// The connection pool, for ad-hoc queries against `nodes` and `trees`.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn kind(&self) -> DbKind {
        self.kind
    }

    pub fn is_sqlite(&self) -> bool {
        self.kind == DbKind::Sqlite
    }

    pub fn is_postgres(&self) -> bool {
        self.kind == DbKind::Postgres
    }
}

#[cfg(feature = "sqlite")]
impl SqlxBackend {
    /// Open the tree database file at `path`, creating the file and the
    /// `trees`/`nodes` tables on first use.
    ///
    /// ```ignore
    /// let backend = Sqlite::open_sqlite("data/mptree.db").await?;
    /// let store = TreeStore::open(Arc::new(backend), TreeConfig::default()).await?;
    /// ```
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect with a raw sqlx URL such as `sqlite:./mptree.db`.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // The last connection closing destroys a shared-cache in-memory
        // database, so keep one open for the lifetime of the pool.
        let mut options = AnyPoolOptions::new().max_connections(5);
        if is_in_memory {
            options = options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        // PRAGMAs are per connection; run them on every new one.
        let pool = options
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if is_in_memory {
                        conn.execute("PRAGMA busy_timeout = 5000;").await?;
                    } else {
                        // WAL lets readers proceed alongside the single writer.
                        conn.execute(
                            "PRAGMA journal_mode = WAL;
                             PRAGMA synchronous = NORMAL;
                             PRAGMA busy_timeout = 5000;",
                        )
                        .await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        let backend = Self {
            pool,
            kind: DbKind::Sqlite,
        };

        schema::initialize(&backend).await?;

        Ok(backend)
    }

    /// A private in-memory database, dropped with the backend.
    pub async fn sqlite_in_memory() -> Result<Self> {
        // Shared cache so every pooled connection sees the same database; a
        // unique name per instance keeps tests apart.
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

#[cfg(feature = "postgres")]
impl SqlxBackend {
    /// Connect to the server at `url` and keep trees in its default schema.
    ///
    /// ```ignore
    /// let backend = Postgres::connect_postgres("postgres://localhost/mptree").await?;
    /// ```
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        Self::connect_postgres_with_schema(url, None).await
    }

    /// Connect, optionally placing `trees` and `nodes` in their own schema.
    async fn connect_postgres_with_schema(url: &str, schema_name: Option<String>) -> Result<Self> {
        sqlx::any::install_default_drivers();

        if let Some(ref schema) = schema_name {
            let temp_pool = AnyPoolOptions::new()
                .max_connections(1)
                .connect(url)
                .await
                .sql_context("Failed to connect to PostgreSQL")?;

            let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {schema}");
            sqlx::query(&create_schema)
                .execute(&temp_pool)
                .await
                .sql_context(&format!("Failed to create schema {schema}"))?;

            temp_pool.close().await;
        }

        let schema_for_hook = schema_name.clone();
        let mut pool_options = AnyPoolOptions::new();

        if schema_name.is_some() {
            // Throwaway schemas are for tests; many run against one server.
            pool_options = pool_options
                .max_connections(2)
                .acquire_timeout(Duration::from_secs(30));
        } else {
            pool_options = pool_options.max_connections(5);
        }

        let pool = pool_options
            .after_connect(move |conn, _meta| {
                let schema = schema_for_hook.clone();
                Box::pin(async move {
                    if let Some(ref s) = schema {
                        let set_path = format!("SET search_path TO {s}");
                        conn.execute(set_path.as_str()).await?;
                    }
                    // Writers queue on the tree row rather than failing fast.
                    conn.execute("SET lock_timeout = '5s'").await?;
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let backend = Self {
            pool,
            kind: DbKind::Postgres,
        };

        schema::initialize(&backend).await?;

        Ok(backend)
    }

    /// Connect inside a freshly created `test_<uuid>` schema, so parallel
    /// test runs never see each other's trees.
    pub async fn connect_postgres_isolated(url: &str) -> Result<Self> {
        let unique_id = uuid::Uuid::new_v4().simple().to_string();
        let schema_name = format!("test_{unique_id}");
        Self::connect_postgres_with_schema(url, Some(schema_name)).await
    }
}

#[async_trait]
impl BackendImpl for SqlxBackend {
    async fn ensure_tree(&self, tree: &str) -> Result<()> {
        let statement = if self.is_sqlite() {
            "INSERT OR IGNORE INTO trees (name, revision) VALUES ($1, 0)"
        } else {
            "INSERT INTO trees (name, revision) VALUES ($1, 0) ON CONFLICT (name) DO NOTHING"
        };
        let created = sqlx::query(statement)
            .bind(tree)
            .execute(&self.pool)
            .await
            .sql_context("Failed to create tree")?
            .rows_affected();
        if created > 0 {
            tracing::debug!(tree, "Created SQL tree");
        }
        Ok(())
    }

    async fn list_trees(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM trees ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .sql_context("Failed to list trees")?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn begin(&self, tree: &str, mode: TxnMode) -> Result<Box<dyn TreeTxn>> {
        let txn = SqlTxn::begin(self, tree, mode).await?;
        Ok(Box::new(txn))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// [`SqlxBackend`] opened on SQLite.
#[cfg(feature = "sqlite")]
pub type Sqlite = SqlxBackend;

/// [`SqlxBackend`] opened on PostgreSQL.
#[cfg(feature = "postgres")]
pub type Postgres = SqlxBackend;
