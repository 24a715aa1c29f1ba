//! Registry of node kinds.
//!
//! A [`KindRegistry`] is built once at startup and handed to
//! [`TreeStore::open_with_registry`](crate::TreeStore::open_with_registry).
//! Every insert and move then checks the node's kind against it: the kind
//! must be registered, and the new parent (or the root level) must be one the
//! kind accepts. Stores opened without a registry accept any kind.
//!
//! ```
//! use mptree::registry::{KindRegistry, KindRule};
//!
//! let registry = KindRegistry::builder()
//!     .kind("collection")
//!     .kind(KindRule::new("page").under(["collection", "page"]).not_root())
//!     .build()
//!     .unwrap();
//!
//! assert!(registry.check("page", Some("collection")).is_ok());
//! assert!(registry.check("page", None).is_err());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Errors raised while building or consulting a [`KindRegistry`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// The kind was never registered.
    #[error("Node kind '{kind}' is not registered")]
    KindNotRegistered {
        /// The unknown kind
        kind: String,
    },

    /// The kind does not accept this parent.
    #[error("Node kind '{kind}' is not allowed {}", describe_parent(.parent))]
    KindNotAllowed {
        /// The kind being placed
        kind: String,
        /// Kind of the prospective parent; `None` for the root level
        parent: Option<String>,
    },

    /// The same kind was registered twice.
    #[error("Node kind '{kind}' is registered more than once")]
    DuplicateKind {
        /// The repeated kind
        kind: String,
    },

    /// A rule names a parent kind that is not registered.
    #[error("Node kind '{kind}' lists unregistered parent kind '{parent}'")]
    UnknownParentKind {
        /// The kind whose rule is broken
        kind: String,
        /// The unregistered parent it names
        parent: String,
    },
}

fn describe_parent(parent: &Option<String>) -> String {
    match parent {
        Some(parent) => format!("under '{parent}'"),
        None => "at the root level".to_string(),
    }
}

impl RegistryError {
    /// Check if this error names an unknown kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::KindNotRegistered { .. })
    }

    /// Check if this error rejected a node placement.
    pub fn is_placement_error(&self) -> bool {
        matches!(
            self,
            RegistryError::KindNotRegistered { .. } | RegistryError::KindNotAllowed { .. }
        )
    }

    /// Check if this error came from an inconsistent registry definition.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            RegistryError::DuplicateKind { .. } | RegistryError::UnknownParentKind { .. }
        )
    }
}

impl From<RegistryError> for crate::Error {
    fn from(err: RegistryError) -> Self {
        crate::Error::Registry(err)
    }
}

/// Placement rule for one kind.
///
/// By default a kind may sit at the root level and under any registered kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRule {
    name: String,
    root_allowed: bool,
    parents: Option<BTreeSet<String>>,
}

impl KindRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_allowed: true,
            parents: None,
        }
    }

    /// Forbid this kind at the root level.
    pub fn not_root(mut self) -> Self {
        self.root_allowed = false;
        self
    }

    /// Restrict the kinds this kind may be a child of.
    pub fn under<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = Some(parents.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn allows(&self, parent: Option<&str>) -> bool {
        match parent {
            None => self.root_allowed,
            Some(parent) => self
                .parents
                .as_ref()
                .is_none_or(|parents| parents.contains(parent)),
        }
    }
}

impl From<&str> for KindRule {
    fn from(name: &str) -> Self {
        KindRule::new(name)
    }
}

impl From<String> for KindRule {
    fn from(name: String) -> Self {
        KindRule::new(name)
    }
}

/// Immutable table of node kinds and where they may be placed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindRegistry {
    rules: BTreeMap<String, KindRule>,
}

impl KindRegistry {
    pub fn builder() -> KindRegistryBuilder {
        KindRegistryBuilder::default()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.rules.contains_key(kind)
    }

    /// Registered kind names, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Check that a node of `kind` may be placed under a parent of
    /// `parent_kind` (`None` for the root level).
    pub fn check(&self, kind: &str, parent_kind: Option<&str>) -> Result<(), RegistryError> {
        let rule = self
            .rules
            .get(kind)
            .ok_or_else(|| RegistryError::KindNotRegistered {
                kind: kind.to_string(),
            })?;
        if rule.allows(parent_kind) {
            Ok(())
        } else {
            Err(RegistryError::KindNotAllowed {
                kind: kind.to_string(),
                parent: parent_kind.map(str::to_string),
            })
        }
    }
}

/// Builder for [`KindRegistry`].
#[derive(Debug, Default)]
pub struct KindRegistryBuilder {
    rules: Vec<KindRule>,
}

impl KindRegistryBuilder {
    /// Register a kind. Accepts a bare name or a [`KindRule`].
    pub fn kind(mut self, rule: impl Into<KindRule>) -> Self {
        self.rules.push(rule.into());
        self
    }

    /// Validate the rules and freeze them.
    ///
    /// # Errors
    /// [`RegistryError::DuplicateKind`] or [`RegistryError::UnknownParentKind`].
    pub fn build(self) -> Result<KindRegistry, RegistryError> {
        let mut rules = BTreeMap::new();
        for rule in self.rules {
            if rules.contains_key(&rule.name) {
                return Err(RegistryError::DuplicateKind { kind: rule.name });
            }
            rules.insert(rule.name.clone(), rule);
        }
        for rule in rules.values() {
            if let Some(parent) = rule
                .parents
                .iter()
                .flatten()
                .find(|parent| !rules.contains_key(*parent))
            {
                return Err(RegistryError::UnknownParentKind {
                    kind: rule.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
        Ok(KindRegistry { rules })
    }
}
