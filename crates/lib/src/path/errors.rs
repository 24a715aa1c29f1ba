//! Path encoding error types.

use thiserror::Error;

/// Errors produced while encoding, decoding or allocating materialized paths.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The configured alphabet cannot produce sortable paths.
    #[error("Invalid path alphabet: {reason}")]
    InvalidAlphabet {
        /// Why the alphabet was rejected
        reason: String,
    },

    /// The configured segment width is unusable.
    #[error("Invalid steplen {steplen}: {reason}")]
    InvalidSteplen {
        /// The rejected steplen
        steplen: usize,
        /// Why it was rejected
        reason: String,
    },

    /// A stored or supplied path does not follow the encoding.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// A segment value does not fit in the fixed segment width.
    #[error("Segment value {value} exceeds capacity {capacity}")]
    SegmentOutOfRange {
        /// The value that was asked to be encoded
        value: u64,
        /// Number of distinct segment values per level
        capacity: u64,
    },

    /// A level has no free segment left for another node.
    #[error("Path overflow under '{parent}': level already holds {capacity} nodes")]
    PathOverflow {
        /// Path of the full parent (empty for the root level)
        parent: String,
        /// Number of distinct segment values per level
        capacity: u64,
    },
}

impl PathError {
    /// Check if this error signals an exhausted level.
    pub fn is_overflow(&self) -> bool {
        matches!(
            self,
            PathError::PathOverflow { .. } | PathError::SegmentOutOfRange { .. }
        )
    }

    /// Check if this error was caused by configuration rather than data.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PathError::InvalidAlphabet { .. } | PathError::InvalidSteplen { .. }
        )
    }

    /// Check if this error points at a malformed stored path.
    pub fn is_integrity_error(&self) -> bool {
        matches!(self, PathError::InvalidPath { .. })
    }
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}
