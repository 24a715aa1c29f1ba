//! Nested JSON export and import.

use std::path::Path;

use mptree::store::BulkNode;
use mptree::{NodeId, TreeStore};

use crate::cli::Format;
use crate::output::print_json;

/// Run the `dump` command. Always prints JSON.
pub async fn dump(
    store: &TreeStore,
    parent: Option<NodeId>,
    no_ids: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut nodes = store.dump_bulk(parent).await?;
    if no_ids {
        nodes = nodes.into_iter().map(BulkNode::without_ids).collect();
    }
    print_json(&nodes)?;
    Ok(())
}

/// Run the `load` command
pub async fn load(
    store: &TreeStore,
    file: &Path,
    parent: Option<NodeId>,
    fresh_ids: bool,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = tokio::fs::read_to_string(file).await?;
    let mut nodes: Vec<BulkNode> = serde_json::from_str(&raw)?;
    if fresh_ids {
        nodes = nodes.into_iter().map(BulkNode::without_ids).collect();
    }
    let created = store.load_bulk(parent, nodes).await?;
    match format {
        Format::Human => println!("Loaded {} node(s) from {}", created.len(), file.display()),
        Format::Json => print_json(&created)?,
    }
    Ok(())
}
