//! Tree configuration.
//!
//! A [`TreeConfig`] names a tree inside a backend and fixes its path encoding.
//! The encoding must never change for a tree that already holds nodes; the
//! store checks stored paths against it in [`TreeStore::find_problems`].
//!
//! [`TreeStore::find_problems`]: crate::store::TreeStore::find_problems

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ALPHABET, DEFAULT_STEPLEN, DEFAULT_TREE};
use crate::path::{PathCodec, PathError};
use crate::store::TreeError;

/// Configuration of one tree.
///
/// ```
/// use mptree::TreeConfig;
///
/// let config: TreeConfig = serde_json::from_str(r#"{"name": "pages"}"#).unwrap();
/// assert_eq!(config.steplen, 4);
/// assert_eq!(config.codec().unwrap().capacity(), 36u64.pow(4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Tree name; several trees can share one backend.
    #[serde(default = "default_name")]
    pub name: String,
    /// Strictly ascending ASCII alphabet for path segments.
    #[serde(default = "default_alphabet")]
    pub alphabet: String,
    /// Characters per path segment.
    #[serde(default = "default_steplen")]
    pub steplen: usize,
}

fn default_name() -> String {
    DEFAULT_TREE.to_string()
}

fn default_alphabet() -> String {
    DEFAULT_ALPHABET.to_string()
}

fn default_steplen() -> usize {
    DEFAULT_STEPLEN
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            alphabet: default_alphabet(),
            steplen: default_steplen(),
        }
    }
}

impl TreeConfig {
    /// Default encoding for a tree called `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.alphabet = alphabet.into();
        self
    }

    pub fn with_steplen(mut self, steplen: usize) -> Self {
        self.steplen = steplen;
        self
    }

    /// Build the path codec, validating alphabet and steplen.
    pub fn codec(&self) -> Result<PathCodec, PathError> {
        PathCodec::new(&self.alphabet, self.steplen)
    }

    /// Check the whole configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(TreeError::InvalidConfiguration {
                reason: "tree name must not be empty".to_string(),
            }
            .into());
        }
        self.codec()?;
        Ok(())
    }
}
