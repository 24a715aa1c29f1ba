//! Read-only commands: roots, show, tree.

use mptree::{NodeId, TreeStore};

use crate::cli::Format;
use crate::output::{print_json, print_nodes, print_outline};

/// Run the `roots` command
pub async fn roots(store: &TreeStore, format: Format) -> Result<(), Box<dyn std::error::Error>> {
    let roots = store.get_root_nodes().await?;
    print_nodes(format, &roots)?;
    Ok(())
}

/// Run the `show` command
pub async fn show(
    store: &TreeStore,
    id: NodeId,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let node = store.get(id).await?;
    let parent = store.get_parent(id).await?;
    let children = store.get_children(id).await?;

    match format {
        Format::Human => {
            println!("ID:        {}", node.id());
            println!("Kind:      {}", node.kind());
            println!("Path:      {}", node.path());
            println!("Depth:     {}", node.depth());
            match &parent {
                Some(parent) => println!("Parent:    {}", parent.id()),
                None => println!("Parent:    (root)"),
            }
            println!("Children:  {}", node.numchild());
            println!("Data:      {}", serde_json::to_string_pretty(node.data())?);
            if !children.is_empty() {
                println!();
                print_nodes(format, &children)?;
            }
        }
        Format::Json => {
            let value = serde_json::json!({
                "node": node,
                "parent": parent.map(|p| p.id()),
                "children": children,
            });
            print_json(&value)?;
        }
    }
    Ok(())
}

/// Run the `tree` command
pub async fn tree(
    store: &TreeStore,
    parent: Option<NodeId>,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let nodes = store.get_tree(parent).await?;
    match format {
        Format::Human => print_outline(&nodes),
        Format::Json => print_json(&nodes)?,
    }
    Ok(())
}
