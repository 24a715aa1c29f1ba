//! Materialized path encoding.
//!
//! A path is a concatenation of fixed-width segments, one per tree level. Each
//! segment encodes a sibling slot number in a fixed, strictly ascending
//! alphabet, left-padded with the alphabet's first character. Because every
//! segment has the same width and the alphabet is sorted, byte-wise string
//! order of paths equals numeric order of the slots, which in turn equals a
//! pre-order traversal of the forest.
//!
//! ```
//! use mptree::path::PathCodec;
//!
//! let codec = PathCodec::new("0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ", 4).unwrap();
//! assert_eq!(codec.encode(37).unwrap(), "0011");
//! assert_eq!(codec.child_path("0001", 0).unwrap(), "00010000");
//! assert_eq!(codec.parent_path("00010000"), "0001");
//! ```

mod errors;

pub use errors::PathError;

use crate::constants::PARK_CHAR;

/// Encoder/decoder for fixed-alphabet, fixed-width path segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCodec {
    alphabet: String,
    steplen: usize,
    capacity: u64,
}

impl PathCodec {
    /// Create a codec after validating the alphabet and steplen.
    ///
    /// The alphabet must contain at least two strictly ascending ASCII
    /// characters below `0x7F`. `0x7F` itself is reserved for parking subtrees
    /// during moves.
    pub fn new(alphabet: &str, steplen: usize) -> Result<Self, PathError> {
        if !alphabet.is_ascii() {
            return Err(PathError::InvalidAlphabet {
                reason: "alphabet must be ASCII".to_string(),
            });
        }
        let bytes = alphabet.as_bytes();
        if bytes.len() < 2 {
            return Err(PathError::InvalidAlphabet {
                reason: "alphabet needs at least two characters".to_string(),
            });
        }
        if let Some(&b) = bytes.iter().find(|&&b| b >= PARK_CHAR as u8 || b < 0x20) {
            return Err(PathError::InvalidAlphabet {
                reason: format!("character 0x{b:02X} is reserved or not printable"),
            });
        }
        if bytes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PathError::InvalidAlphabet {
                reason: "characters must be unique and in ascending order".to_string(),
            });
        }
        if steplen == 0 {
            return Err(PathError::InvalidSteplen {
                steplen,
                reason: "segments need at least one character".to_string(),
            });
        }
        let capacity = u32::try_from(steplen)
            .ok()
            .and_then(|exp| (bytes.len() as u64).checked_pow(exp))
            .ok_or_else(|| PathError::InvalidSteplen {
                steplen,
                reason: "level capacity does not fit in 64 bits".to_string(),
            })?;

        Ok(Self {
            alphabet: alphabet.to_string(),
            steplen,
            capacity,
        })
    }

    /// The alphabet segments are written in.
    pub fn alphabet(&self) -> &str {
        &self.alphabet
    }

    /// Characters per segment.
    pub fn steplen(&self) -> usize {
        self.steplen
    }

    /// Number of distinct slots per level (`alphabet_len ^ steplen`).
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    fn base(&self) -> u64 {
        self.alphabet.len() as u64
    }

    /// Encode a slot number as one fixed-width segment.
    pub fn encode(&self, value: u64) -> Result<String, PathError> {
        if value >= self.capacity {
            return Err(PathError::SegmentOutOfRange {
                value,
                capacity: self.capacity,
            });
        }
        let alphabet = self.alphabet.as_bytes();
        let mut buf = vec![alphabet[0]; self.steplen];
        let mut rest = value;
        for slot in buf.iter_mut().rev() {
            *slot = alphabet[(rest % self.base()) as usize];
            rest /= self.base();
        }
        // Alphabet is validated ASCII so every byte is a char boundary.
        Ok(buf.into_iter().map(char::from).collect())
    }

    /// Decode one segment back into its slot number.
    pub fn decode(&self, segment: &str) -> Result<u64, PathError> {
        if segment.len() != self.steplen {
            return Err(PathError::InvalidPath {
                path: segment.to_string(),
                reason: format!("segment must be {} characters", self.steplen),
            });
        }
        let alphabet = self.alphabet.as_bytes();
        segment.bytes().try_fold(0u64, |acc, b| {
            let digit = alphabet
                .binary_search(&b)
                .map_err(|_| PathError::InvalidPath {
                    path: segment.to_string(),
                    reason: format!("character 0x{b:02X} is not in the alphabet"),
                })?;
            Ok(acc * self.base() + digit as u64)
        })
    }

    /// Path of the child of `parent` that occupies slot `value`.
    ///
    /// `parent` is empty for the root level.
    pub fn child_path(&self, parent: &str, value: u64) -> Result<String, PathError> {
        let segment = self.encode(value)?;
        let mut path = String::with_capacity(parent.len() + self.steplen);
        path.push_str(parent);
        path.push_str(&segment);
        Ok(path)
    }

    /// Path of the parent, or the empty string for a root path.
    pub fn parent_path<'a>(&self, path: &'a str) -> &'a str {
        &path[..path.len().saturating_sub(self.steplen)]
    }

    /// All strict ancestor paths, root first.
    pub fn ancestor_paths<'a>(&self, path: &'a str) -> Vec<&'a str> {
        (1..self.depth_of(path))
            .map(|depth| &path[..depth * self.steplen])
            .collect()
    }

    /// Slot number of the last segment of `path`.
    pub fn last_segment_value(&self, path: &str) -> Result<u64, PathError> {
        if path.len() < self.steplen {
            return Err(PathError::InvalidPath {
                path: path.to_string(),
                reason: "path is shorter than one segment".to_string(),
            });
        }
        self.decode(&path[path.len() - self.steplen..])
    }

    /// Number of segments in `path` (rounded down).
    pub fn depth_of(&self, path: &str) -> usize {
        path.len() / self.steplen
    }

    /// Check that `path` is non-empty, a whole number of segments, and only
    /// uses alphabet characters.
    pub fn validate_path(&self, path: &str) -> Result<(), PathError> {
        if path.is_empty() {
            return Err(PathError::InvalidPath {
                path: String::new(),
                reason: "path is empty".to_string(),
            });
        }
        if path.len() % self.steplen != 0 {
            return Err(PathError::InvalidPath {
                path: path.to_string(),
                reason: format!("length is not a multiple of steplen {}", self.steplen),
            });
        }
        if let Some(b) = path.bytes().find(|b| !self.alphabet.as_bytes().contains(b)) {
            return Err(PathError::InvalidPath {
                path: path.to_string(),
                reason: format!("character 0x{b:02X} is not in the alphabet"),
            });
        }
        Ok(())
    }
}

impl Default for PathCodec {
    fn default() -> Self {
        Self {
            alphabet: crate::constants::DEFAULT_ALPHABET.to_string(),
            steplen: crate::constants::DEFAULT_STEPLEN,
            capacity: 36u64.pow(crate::constants::DEFAULT_STEPLEN as u32),
        }
    }
}

/// Exclusive upper bound of the key range holding `prefix` and everything
/// below it.
///
/// Every valid path character sorts below [`PARK_CHAR`], so
/// `[prefix, upper_bound(prefix))` covers exactly the subtree.
pub(crate) fn upper_bound(prefix: &str) -> String {
    let mut upper = String::with_capacity(prefix.len() + 1);
    upper.push_str(prefix);
    upper.push(PARK_CHAR);
    upper
}
