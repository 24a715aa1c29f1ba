//! Backend creation and utility functions.

use std::path::PathBuf;
use std::sync::Arc;

use mptree::backend::{
    BackendImpl,
    database::{InMemory, Postgres, Sqlite},
};

use crate::cli::{Backend, BackendConfig};

const SQLITE_FILE: &str = "mptree.db";
const JSON_FILE: &str = "mptree.json";

/// An opened backend, plus the snapshot file to write back for in-memory
/// storage.
pub struct OpenedBackend {
    pub backend: Arc<dyn BackendImpl>,
    pub snapshot: Option<PathBuf>,
}

impl OpenedBackend {
    /// Write the in-memory state back to its snapshot file. No-op for SQL
    /// backends, which commit as they go.
    pub async fn persist(&self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };
        if let Some(in_memory) = self.backend.as_any().downcast_ref::<InMemory>() {
            in_memory.save_to_file(path).await?;
            tracing::debug!("Saved in-memory snapshot to {}", path.display());
        }
        Ok(())
    }
}

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let mut redacted = parsed.clone();
            if !parsed.username().is_empty() {
                let _ = redacted.set_username("***");
            }
            if parsed.password().is_some() {
                let _ = redacted.set_password(Some("***"));
            }
            redacted.to_string()
        }
        Err(_) => "postgres://***@<unparsable-url>".to_string(),
    }
}

/// Short human-readable description of the configured backend.
pub fn backend_label(config: &BackendConfig) -> String {
    let data_dir = config
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    match config.backend {
        Backend::Sqlite => format!("sqlite ({})", data_dir.join(SQLITE_FILE).display()),
        Backend::Postgres => match &config.postgres_url {
            Some(url) => format!("postgres ({})", redact_postgres_url(url)),
            None => "postgres".to_string(),
        },
        Backend::Inmemory => format!("inmemory ({})", data_dir.join(JSON_FILE).display()),
    }
}

/// Create the appropriate backend based on configuration
pub async fn create_backend(
    config: &BackendConfig,
) -> Result<OpenedBackend, Box<dyn std::error::Error>> {
    let data_dir = config
        .data_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    match config.backend {
        Backend::Sqlite => {
            tokio::fs::create_dir_all(&data_dir).await?;
            let db_path = data_dir.join(SQLITE_FILE);
            tracing::debug!("Using SQLite backend at {}", db_path.display());
            Ok(OpenedBackend {
                backend: Arc::new(Sqlite::open_sqlite(&db_path).await?),
                snapshot: None,
            })
        }
        Backend::Postgres => {
            let url = config
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or MPTREE_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::debug!("Connecting to PostgreSQL backend at {display_url}");

            match Postgres::connect_postgres(url).await {
                Ok(backend) => Ok(OpenedBackend {
                    backend: Arc::new(backend),
                    snapshot: None,
                }),
                Err(e) => {
                    Err(format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
                }
            }
        }
        Backend::Inmemory => {
            tokio::fs::create_dir_all(&data_dir).await?;
            let json_path = data_dir.join(JSON_FILE);
            tracing::debug!(
                "Using in-memory backend with persistence at {}",
                json_path.display()
            );
            let backend = InMemory::load_from_file(&json_path).await?;
            Ok(OpenedBackend {
                backend: Arc::new(backend),
                snapshot: Some(json_path),
            })
        }
    }
}
