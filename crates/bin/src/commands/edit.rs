//! Commands that change tree shape or payloads.

use mptree::{Node, NodeId, NodeSpec, Position, TreeStore};

use crate::cli::{Format, NodeArgs};
use crate::output::{print_json, print_nodes};

fn spec(args: NodeArgs) -> NodeSpec {
    NodeSpec::of_kind(args.kind).with_data(args.data)
}

fn print_created(node: &Node, format: Format) -> Result<(), serde_json::Error> {
    match format {
        Format::Human => {
            println!("Created {} at {}", node.id(), node.path());
            Ok(())
        }
        Format::Json => print_json(node),
    }
}

/// Run the `add-root` command
pub async fn add_root(
    store: &TreeStore,
    args: NodeArgs,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let node = store.add_root(spec(args)).await?;
    print_created(&node, format)?;
    Ok(())
}

/// Run the `add-child` command
pub async fn add_child(
    store: &TreeStore,
    parent: NodeId,
    args: NodeArgs,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let node = store.add_child(parent, spec(args)).await?;
    print_created(&node, format)?;
    Ok(())
}

/// Run the `add-sibling` command
pub async fn add_sibling(
    store: &TreeStore,
    node: NodeId,
    position: Position,
    args: NodeArgs,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let created = store.add_sibling(node, position, spec(args)).await?;
    print_created(&created, format)?;
    Ok(())
}

/// Run the `move` command
pub async fn move_node(
    store: &TreeStore,
    node: NodeId,
    target: NodeId,
    position: Position,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    store.move_node(node, target, position).await?;
    let moved = store.get(node).await?;
    match format {
        Format::Human => println!("Moved {} to {}", moved.id(), moved.path()),
        Format::Json => print_json(&moved)?,
    }
    Ok(())
}

/// Run the `delete` command
pub async fn delete(
    store: &TreeStore,
    node: NodeId,
    format: Format,
) -> Result<(), Box<dyn std::error::Error>> {
    let removed = store.delete(node).await?;
    match format {
        Format::Human => println!("Deleted {removed} node(s)"),
        Format::Json => print_json(&serde_json::json!({ "deleted": removed }))?,
    }
    // Show what is left at the top level so the effect is visible.
    if matches!(format, Format::Human) {
        let roots = store.get_root_nodes().await?;
        if !roots.is_empty() {
            println!();
            print_nodes(format, &roots)?;
        }
    }
    Ok(())
}
