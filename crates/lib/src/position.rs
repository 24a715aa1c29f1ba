//! Insertion and move positions relative to a reference node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::TreeError;

/// Where a node goes relative to a reference node.
///
/// Sibling positions place the node among the reference node's siblings;
/// child positions place it under the reference node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    /// First among the reference node's siblings.
    FirstSibling,
    /// Immediately before the reference node.
    Left,
    /// Immediately after the reference node.
    Right,
    /// Last among the reference node's siblings.
    LastSibling,
    /// First child of the reference node.
    FirstChild,
    /// Last child of the reference node.
    LastChild,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::FirstSibling,
        Position::Left,
        Position::Right,
        Position::LastSibling,
        Position::FirstChild,
        Position::LastChild,
    ];

    /// True for positions that place the node under the reference node.
    pub fn is_child(&self) -> bool {
        matches!(self, Position::FirstChild | Position::LastChild)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::FirstSibling => "first-sibling",
            Position::Left => "left",
            Position::Right => "right",
            Position::LastSibling => "last-sibling",
            Position::FirstChild => "first-child",
            Position::LastChild => "last-child",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| TreeError::InvalidPosition {
                position: s.to_string(),
                operation: "parse".to_string(),
            })
    }
}
