//! Output formatting helpers for human-readable and JSON output.

use mptree::Node;
use serde::Serialize;

use crate::cli::Format;

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render = |cells: Vec<&str>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", render(headers.to_vec()));
    for row in rows {
        println!(
            "{}",
            render(row.iter().take(col_count).map(String::as_str).collect())
        );
    }
}

pub const NODE_HEADERS: [&str; 6] = ["ID", "PATH", "DEPTH", "CHILDREN", "KIND", "DATA"];

pub fn node_row(node: &Node) -> Vec<String> {
    vec![
        node.id().to_string(),
        node.path().to_string(),
        node.depth().to_string(),
        node.numchild().to_string(),
        node.kind().to_string(),
        compact_data(node.data()),
    ]
}

/// One-line payload preview; `null` is shown as empty.
fn compact_data(data: &serde_json::Value) -> String {
    if data.is_null() {
        String::new()
    } else {
        data.to_string()
    }
}

/// Print a list of nodes as a table or a JSON array.
pub fn print_nodes(format: Format, nodes: &[Node]) -> Result<(), serde_json::Error> {
    match format {
        Format::Json => print_json(&nodes),
        Format::Human => {
            if nodes.is_empty() {
                println!("(no nodes)");
            } else {
                let rows: Vec<Vec<String>> = nodes.iter().map(node_row).collect();
                print_table(&NODE_HEADERS, &rows);
            }
            Ok(())
        }
    }
}

/// Print pre-ordered nodes as an indented outline.
pub fn print_outline(nodes: &[Node]) {
    let Some(base) = nodes.iter().map(Node::depth).min() else {
        println!("(empty tree)");
        return;
    };
    for node in nodes {
        let indent = "  ".repeat(node.depth() - base);
        let data = compact_data(node.data());
        if data.is_empty() {
            println!("{indent}{} [{}] {}", node.kind(), node.path(), node.id());
        } else {
            println!(
                "{indent}{} [{}] {} {data}",
                node.kind(),
                node.path(),
                node.id()
            );
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
