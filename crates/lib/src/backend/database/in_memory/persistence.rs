//! Persistence operations for the InMemory backend
//!
//! Trees are written as one JSON document holding each tree's revision and
//! its rows in path order. The id index is rebuilt on load.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use super::{InMemory, TreeTable};
use crate::{Error, Result, backend::errors::BackendError, node::Node};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

#[derive(Serialize, Deserialize)]
struct SerializableTree {
    revision: u64,
    nodes: Vec<Node>,
}

#[derive(Serialize, Deserialize)]
struct SerializableDatabase {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(default)]
    trees: BTreeMap<String, SerializableTree>,
}

/// Saves every tree to a specified file as JSON.
///
/// Each tree is read under its own shared lock, so the snapshot of one tree
/// is consistent even while other trees are being written.
pub(crate) async fn save_to_file<P: AsRef<Path>>(backend: &InMemory, path: P) -> Result<()> {
    let handles: Vec<(String, Arc<RwLock<TreeTable>>)> = backend
        .trees
        .read()
        .await
        .iter()
        .map(|(name, table)| (name.clone(), Arc::clone(table)))
        .collect();

    let mut trees = BTreeMap::new();
    for (name, table) in handles {
        let table = table.read().await;
        trees.insert(
            name,
            SerializableTree {
                revision: table.revision,
                nodes: table.nodes.values().cloned().collect(),
            },
        );
    }

    let serializable = SerializableDatabase {
        version: PERSISTENCE_VERSION,
        trees,
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })
}

/// Loads the backend state from a specified JSON file.
///
/// If the file does not exist, a new, empty `InMemory` backend is returned.
pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<InMemory> {
    let json = match tokio::fs::read_to_string(path).await {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(InMemory::new()),
        Err(e) => return Err(BackendError::FileIo { source: e }.into()),
    };
    let serializable: SerializableDatabase = serde_json::from_str(&json)
        .map_err(|e| -> Error { BackendError::DeserializationFailed { source: e }.into() })?;

    let trees = serializable
        .trees
        .into_iter()
        .map(|(name, tree)| {
            let table = TreeTable::from_nodes(tree.nodes, tree.revision);
            (name, Arc::new(RwLock::new(table)))
        })
        .collect();

    Ok(InMemory {
        trees: RwLock::new(trees),
    })
}
