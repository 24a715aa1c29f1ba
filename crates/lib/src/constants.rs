//! Constants used throughout the mptree library.
//!
//! This module provides central definitions for path encoding defaults and
//! reserved values.

/// Default path alphabet: digits then uppercase letters (base 36).
pub const DEFAULT_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Default number of characters per path segment.
pub const DEFAULT_STEPLEN: usize = 4;

/// Tree name used when none is configured.
pub const DEFAULT_TREE: &str = "default";

/// Node kind assigned when a caller does not name one.
pub const DEFAULT_KIND: &str = "node";

/// Reserved path character.
///
/// Sorts after every valid alphabet character. Subtrees being moved are
/// parked under this prefix, which keeps them out of every range scan.
pub const PARK_CHAR: char = '\u{7f}';
