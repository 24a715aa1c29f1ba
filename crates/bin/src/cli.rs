//! CLI argument definitions for the mptree binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mptree::{NodeId, Position, TreeConfig, constants};

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database (default)
    Sqlite,
    /// PostgreSQL database
    Postgres,
    /// In-memory with JSON persistence (for development and fixtures)
    Inmemory,
}

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    /// Aligned tables and indented trees
    Human,
    /// One JSON document per command
    Json,
}

/// Where the trees are stored.
#[derive(clap::Args, Debug)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "MPTREE_BACKEND", global = true)]
    pub backend: Backend,

    /// Data directory for storage files.
    /// For SQLite: stores mptree.db
    /// For InMemory: stores mptree.json
    #[arg(short = 'D', long, env = "MPTREE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "MPTREE_POSTGRES_URL", global = true)]
    pub postgres_url: Option<String>,
}

/// Which tree to operate on and how its paths are encoded.
#[derive(clap::Args, Debug)]
pub struct TreeArgs {
    /// Tree name
    #[arg(short, long, default_value = constants::DEFAULT_TREE, env = "MPTREE_TREE", global = true)]
    pub tree: String,

    /// Path alphabet (strictly ascending ASCII)
    #[arg(long, default_value = constants::DEFAULT_ALPHABET, env = "MPTREE_ALPHABET", global = true)]
    pub alphabet: String,

    /// Characters per path segment
    #[arg(long, default_value_t = constants::DEFAULT_STEPLEN, env = "MPTREE_STEPLEN", global = true)]
    pub steplen: usize,
}

impl TreeArgs {
    pub fn config(&self) -> TreeConfig {
        TreeConfig::named(&self.tree)
            .with_alphabet(&self.alphabet)
            .with_steplen(self.steplen)
    }
}

/// Materialized-path tree store
#[derive(Parser, Debug)]
#[command(name = "mptree")]
#[command(about = "mptree: inspect and edit materialized-path trees")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub backend_config: BackendConfig,

    #[command(flatten)]
    pub tree: TreeArgs,

    /// Output format
    #[arg(short, long, default_value = "human", env = "MPTREE_FORMAT", global = true)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the top-level nodes
    Roots,
    /// Show one node with its parent and children
    Show {
        /// Node id
        id: NodeId,
    },
    /// Print the forest, or one subtree
    Tree {
        /// Only print this node and its descendants
        #[arg(long)]
        parent: Option<NodeId>,
    },
    /// Add a node after the existing top-level nodes
    AddRoot(NodeArgs),
    /// Add a node as the last child of PARENT
    AddChild {
        /// Parent node id
        parent: NodeId,
        #[command(flatten)]
        node: NodeArgs,
    },
    /// Add a node next to NODE
    AddSibling {
        /// Reference node id
        node: NodeId,
        /// first-sibling, left, right or last-sibling
        position: Position,
        #[command(flatten)]
        spec: NodeArgs,
    },
    /// Move NODE and its subtree relative to TARGET
    Move {
        /// Node to move
        node: NodeId,
        /// Reference node
        target: NodeId,
        /// first-sibling, left, right, last-sibling, first-child or last-child
        position: Position,
    },
    /// Delete a node and everything below it
    Delete {
        /// Node id
        node: NodeId,
    },
    /// Report invariant violations
    Check,
    /// Recompute depth and child counts from paths
    Fix,
    /// Export the forest, or one subtree, as nested JSON
    Dump {
        /// Only export this node and its descendants
        #[arg(long)]
        parent: Option<NodeId>,
        /// Leave node ids out of the export
        #[arg(long)]
        no_ids: bool,
    },
    /// Import nested JSON produced by `dump`
    Load {
        /// JSON file holding a list of nodes
        file: PathBuf,
        /// Insert under this node instead of at the top level
        #[arg(long)]
        parent: Option<NodeId>,
        /// Generate new ids instead of reusing the ones in the file
        #[arg(long)]
        fresh_ids: bool,
    },
}

impl Commands {
    /// Whether the command writes to the tree.
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Commands::Roots
                | Commands::Show { .. }
                | Commands::Tree { .. }
                | Commands::Check
                | Commands::Dump { .. }
        )
    }
}

/// Kind and payload of a new node
#[derive(clap::Args, Debug)]
pub struct NodeArgs {
    /// Node kind
    #[arg(short, long, default_value = constants::DEFAULT_KIND)]
    pub kind: String,

    /// JSON payload
    #[arg(long, default_value = "null", value_parser = parse_json)]
    pub data: serde_json::Value,
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}
