//! Subcommand implementations.
//!
//! Every command opens the backend and the configured tree, does its work,
//! and writes the in-memory snapshot back if it changed anything.

mod bulk;
mod check;
mod edit;
mod read;

use mptree::TreeStore;

use crate::backend::{backend_label, create_backend};
use crate::cli::{Cli, Commands};

/// Run the parsed command line.
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let opened = create_backend(&cli.backend_config).await?;
    let store = TreeStore::open(opened.backend.clone(), cli.tree.config()).await?;
    tracing::debug!(
        backend = %backend_label(&cli.backend_config),
        tree = %store.name(),
        "Opened tree"
    );

    let format = cli.format;
    let mutating = cli.command.is_mutating();
    match cli.command {
        Commands::Roots => read::roots(&store, format).await?,
        Commands::Show { id } => read::show(&store, id, format).await?,
        Commands::Tree { parent } => read::tree(&store, parent, format).await?,
        Commands::AddRoot(node) => edit::add_root(&store, node, format).await?,
        Commands::AddChild { parent, node } => {
            edit::add_child(&store, parent, node, format).await?
        }
        Commands::AddSibling {
            node,
            position,
            spec,
        } => edit::add_sibling(&store, node, position, spec, format).await?,
        Commands::Move {
            node,
            target,
            position,
        } => edit::move_node(&store, node, target, position, format).await?,
        Commands::Delete { node } => edit::delete(&store, node, format).await?,
        Commands::Check => check::check(&store, format).await?,
        Commands::Fix => check::fix(&store, format).await?,
        Commands::Dump { parent, no_ids } => bulk::dump(&store, parent, no_ids).await?,
        Commands::Load {
            file,
            parent,
            fresh_ids,
        } => bulk::load(&store, &file, parent, fresh_ids, format).await?,
    }

    if mutating {
        opened.persist().await?;
    }
    Ok(())
}
