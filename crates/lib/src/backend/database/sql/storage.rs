//! Tree transactions for SQL backends.
//!
//! Every [`TreeTxn`] primitive is one statement against the `nodes` table.
//! Subtree operations select the key range `[prefix, prefix || 0x7F)`, which
//! the `(tree_name, path)` unique index serves directly.

use async_trait::async_trait;
use sqlx::{Any, Transaction};

use crate::Result;
use crate::backend::errors::BackendError;
use crate::backend::{TreeTxn, TxnMode};
use crate::node::{Node, NodeId};
use crate::path::upper_bound;

use super::{SqlxBackend, SqlxResultExt};

const NODE_COLUMNS: &str = "id, path, depth, numchild, kind, data_json";

type NodeRow = (String, String, i64, i64, String, String);

fn row_to_node(row: NodeRow) -> Result<Node> {
    let (id, path, depth, numchild, kind, data_json) = row;
    let id: NodeId = id.parse().map_err(|e| BackendError::CorruptRow {
        reason: format!("invalid node id '{id}': {e}"),
    })?;
    let depth = usize::try_from(depth).map_err(|_| BackendError::CorruptRow {
        reason: format!("negative depth {depth} at '{path}'"),
    })?;
    let numchild = u64::try_from(numchild).map_err(|_| BackendError::CorruptRow {
        reason: format!("negative numchild {numchild} at '{path}'"),
    })?;
    let data = serde_json::from_str(&data_json)
        .map_err(|e| BackendError::DeserializationFailed { source: e })?;
    Ok(Node::from_parts(id, path, depth, numchild, kind, data))
}

/// One open `sqlx` transaction scoped to a tree.
pub(crate) struct SqlTxn {
    tree: String,
    mode: TxnMode,
    tx: Transaction<'static, Any>,
}

impl SqlTxn {
    /// Open a transaction on `tree`.
    ///
    /// Write transactions bump the tree revision before doing anything else.
    /// That update takes the tree's row lock on PostgreSQL and the database
    /// write lock on SQLite, so a second writer waits here until the first
    /// finishes.
    pub(crate) async fn begin(backend: &SqlxBackend, tree: &str, mode: TxnMode) -> Result<Self> {
        let mut tx = backend
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        let found = match mode {
            TxnMode::Write => {
                sqlx::query("UPDATE trees SET revision = revision + 1 WHERE name = $1")
                    .bind(tree)
                    .execute(&mut *tx)
                    .await
                    .sql_context("Failed to lock tree")?
                    .rows_affected()
                    > 0
            }
            TxnMode::Read => {
                // Lookups that load a node and then scan by its path must see
                // one snapshot.
                if backend.is_postgres() {
                    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
                        .execute(&mut *tx)
                        .await
                        .sql_context("Failed to set read isolation")?;
                }
                let row: Option<(i64,)> =
                    sqlx::query_as("SELECT revision FROM trees WHERE name = $1")
                        .bind(tree)
                        .fetch_optional(&mut *tx)
                        .await
                        .sql_context("Failed to read tree")?;
                row.is_some()
            }
        };
        if !found {
            return Err(BackendError::TreeNotFound {
                tree: tree.to_string(),
            }
            .into());
        }

        Ok(Self {
            tree: tree.to_string(),
            mode,
            tx,
        })
    }

    fn ensure_writable(&self) -> Result<()> {
        match self.mode {
            TxnMode::Write => Ok(()),
            TxnMode::Read => Err(BackendError::ReadOnlyTransaction {
                tree: self.tree.clone(),
            }
            .into()),
        }
    }

    async fn update_column(&mut self, id: &NodeId, column: &str, value: i64) -> Result<()> {
        self.ensure_writable()?;
        let sql = format!("UPDATE nodes SET {column} = $1 WHERE tree_name = $2 AND id = $3");
        let updated = sqlx::query(&sql)
            .bind(value)
            .bind(&self.tree)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .sql_context(&format!("Failed to update {column}"))?
            .rows_affected();
        if updated == 0 {
            return Err(BackendError::NodeNotFound {
                tree: self.tree.clone(),
                id: *id,
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl TreeTxn for SqlTxn {
    fn mode(&self) -> TxnMode {
        self.mode
    }

    async fn get(&mut self, id: &NodeId) -> Result<Option<Node>> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE tree_name = $1 AND id = $2");
        let row: Option<NodeRow> = sqlx::query_as(&sql)
            .bind(&self.tree)
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .sql_context("Failed to get node")?;
        row.map(row_to_node).transpose()
    }

    async fn get_by_path(&mut self, path: &str) -> Result<Option<Node>> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE tree_name = $1 AND path = $2");
        let row: Option<NodeRow> = sqlx::query_as(&sql)
            .bind(&self.tree)
            .bind(path)
            .fetch_optional(&mut *self.tx)
            .await
            .sql_context("Failed to get node by path")?;
        row.map(row_to_node).transpose()
    }

    async fn get_by_paths(&mut self, paths: &[&str]) -> Result<Vec<Node>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders: Vec<String> = (0..paths.len()).map(|i| format!("${}", i + 2)).collect();
        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE tree_name = $1 AND path IN ({}) ORDER BY path",
            placeholders.join(", ")
        );
        let mut query = sqlx::query_as::<_, NodeRow>(&sql).bind(&self.tree);
        for path in paths {
            query = query.bind(*path);
        }
        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .sql_context("Failed to get nodes by path")?;
        rows.into_iter().map(row_to_node).collect()
    }

    async fn scan(&mut self, prefix: &str, depth: Option<usize>) -> Result<Vec<Node>> {
        let mut sql = format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE tree_name = $1 AND path > $2 AND path < $3"
        );
        if depth.is_some() {
            sql.push_str(" AND depth = $4");
        }
        sql.push_str(" ORDER BY path");

        let mut query = sqlx::query_as::<_, NodeRow>(&sql)
            .bind(&self.tree)
            .bind(prefix)
            .bind(upper_bound(prefix));
        if let Some(depth) = depth {
            query = query.bind(depth as i64);
        }
        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .sql_context("Failed to scan nodes")?;
        rows.into_iter().map(row_to_node).collect()
    }

    async fn count(&mut self, prefix: &str) -> Result<u64> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM nodes WHERE tree_name = $1 AND path > $2 AND path < $3",
        )
        .bind(&self.tree)
        .bind(prefix)
        .bind(upper_bound(prefix))
        .fetch_one(&mut *self.tx)
        .await
        .sql_context("Failed to count nodes")?;
        Ok(total.max(0) as u64)
    }

    async fn insert(&mut self, node: &Node) -> Result<()> {
        self.ensure_writable()?;
        let data_json = serde_json::to_string(node.data())
            .map_err(|e| BackendError::SerializationFailed { source: e })?;
        sqlx::query(
            "INSERT INTO nodes (tree_name, id, path, depth, numchild, kind, data_json)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&self.tree)
        .bind(node.id().to_string())
        .bind(node.path())
        .bind(node.depth() as i64)
        .bind(node.numchild() as i64)
        .bind(node.kind())
        .bind(data_json)
        .execute(&mut *self.tx)
        .await
        .sql_context("Failed to insert node")?;
        Ok(())
    }

    async fn relocate(
        &mut self,
        old_prefix: &str,
        new_prefix: &str,
        depth_delta: i64,
    ) -> Result<u64> {
        self.ensure_writable()?;
        // substr is 1-based; paths are ASCII so characters are bytes.
        let suffix_start = old_prefix.len() as i64 + 1;
        let moved = sqlx::query(
            "UPDATE nodes
             SET path = $1 || substr(path, CAST($2 AS INTEGER)), depth = depth + $3
             WHERE tree_name = $4 AND path >= $5 AND path < $6",
        )
        .bind(new_prefix)
        .bind(suffix_start)
        .bind(depth_delta)
        .bind(&self.tree)
        .bind(old_prefix)
        .bind(upper_bound(old_prefix))
        .execute(&mut *self.tx)
        .await
        .sql_context("Failed to relocate subtree")?
        .rows_affected();
        Ok(moved)
    }

    async fn set_numchild(&mut self, id: &NodeId, numchild: u64) -> Result<()> {
        self.update_column(id, "numchild", numchild as i64).await
    }

    async fn set_depth(&mut self, id: &NodeId, depth: usize) -> Result<()> {
        self.update_column(id, "depth", depth as i64).await
    }

    async fn set_data(&mut self, id: &NodeId, data: &serde_json::Value) -> Result<()> {
        self.ensure_writable()?;
        let data_json = serde_json::to_string(data)
            .map_err(|e| BackendError::SerializationFailed { source: e })?;
        let updated = sqlx::query("UPDATE nodes SET data_json = $1 WHERE tree_name = $2 AND id = $3")
            .bind(data_json)
            .bind(&self.tree)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .sql_context("Failed to update node data")?
            .rows_affected();
        if updated == 0 {
            return Err(BackendError::NodeNotFound {
                tree: self.tree.clone(),
                id: *id,
            }
            .into());
        }
        Ok(())
    }

    async fn delete_prefix(&mut self, prefix: &str) -> Result<u64> {
        self.ensure_writable()?;
        let removed =
            sqlx::query("DELETE FROM nodes WHERE tree_name = $1 AND path >= $2 AND path < $3")
                .bind(&self.tree)
                .bind(prefix)
                .bind(upper_bound(prefix))
                .execute(&mut *self.tx)
                .await
                .sql_context("Failed to delete subtree")?
                .rows_affected();
        Ok(removed)
    }

    async fn revision(&mut self) -> Result<u64> {
        let (revision,): (i64,) = sqlx::query_as("SELECT revision FROM trees WHERE name = $1")
            .bind(&self.tree)
            .fetch_one(&mut *self.tx)
            .await
            .sql_context("Failed to read tree revision")?;
        Ok(revision.max(0) as u64)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let SqlTxn { tx, .. } = *self;
        tx.commit().await.sql_context("Failed to commit transaction")
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let SqlTxn { tx, .. } = *self;
        tx.rollback()
            .await
            .sql_context("Failed to roll back transaction")
    }
}
