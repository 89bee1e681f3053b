//! Dialect definitions and effective mappings

use crate::error::{DialectError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single claim dialect as loaded from the catalog source
///
/// Definitions are immutable once part of a [`crate::DialectCatalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectDefinition {
    /// Unique namespace URI (e.g. "urn:ietf:params:scim:schemas:core:2.0:User")
    pub id: String,

    /// Local claim name -> root claim URI
    pub own_mappings: BTreeMap<String, String>,

    /// Parent dialects in declaration order; later parents win on collisions
    pub parents: Vec<String>,

    /// Rewrite inherited keys into this dialect's namespace
    pub override_namespace: bool,
}

impl DialectDefinition {
    /// Create a dialect with no mappings and no parents
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            own_mappings: BTreeMap::new(),
            parents: Vec::new(),
            override_namespace: false,
        }
    }

    /// Add a local -> root mapping
    pub fn with_mapping(mut self, local: impl Into<String>, root: impl Into<String>) -> Self {
        self.own_mappings.insert(local.into(), root.into());
        self
    }

    /// Append a parent dialect
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Replace the parent list
    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    /// Set the override-namespace flag
    pub fn with_override_namespace(mut self, override_namespace: bool) -> Self {
        self.override_namespace = override_namespace;
        self
    }

    /// Whether the dialect declares any mappings of its own
    pub fn has_mappings(&self) -> bool {
        !self.own_mappings.is_empty()
    }

    /// Validate the definition
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DialectError::InvalidDefinition(
                "Dialect identifier cannot be empty".to_string(),
            ));
        }

        for (local, root) in &self.own_mappings {
            if local.trim().is_empty() {
                return Err(DialectError::InvalidDefinition(format!(
                    "Dialect '{}' has a mapping with an empty local claim",
                    self.id
                )));
            }
            if root.trim().is_empty() {
                return Err(DialectError::InvalidDefinition(format!(
                    "Dialect '{}' maps '{}' to an empty root claim",
                    self.id, local
                )));
            }
        }

        if self.parents.iter().any(|p| p.trim().is_empty()) {
            return Err(DialectError::InvalidDefinition(format!(
                "Dialect '{}' has an empty parent identifier",
                self.id
            )));
        }

        Ok(())
    }
}

/// Fully merged local -> root mapping for one dialect
///
/// Produced by the resolution engine and never mutated afterwards. Keys are
/// kept sorted so two resolutions of the same catalog compare and serialize
/// identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectiveMapping {
    entries: BTreeMap<String, String>,
}

impl EffectiveMapping {
    /// Root claim for a local claim
    pub fn get(&self, local: &str) -> Option<&str> {
        self.entries.get(local).map(String::as_str)
    }

    /// Whether the local claim is mapped
    pub fn contains_key(&self, local: &str) -> bool {
        self.entries.contains_key(local)
    }

    /// Number of mapped claims
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All local claims that map to the given root claim
    pub fn locals_for_root(&self, root: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, v)| v.as_str() == root)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Consume into the underlying map
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.entries
    }
}

impl From<BTreeMap<String, String>> for EffectiveMapping {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, String)> for EffectiveMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Remainder of `key` after the `namespace` prefix and its separator
///
/// Returns `None` when `key` is not qualified by `namespace` or nothing
/// follows the prefix.
///
/// ```
/// use claimdialect::types::local_part;
///
/// assert_eq!(local_part("P/address/street", "P"), Some("address/street"));
/// assert_eq!(local_part("urn:acme:User:userName", "urn:acme:User"), Some("userName"));
/// assert_eq!(local_part("Px/name", "P"), None);
/// ```
pub fn local_part<'k>(key: &'k str, namespace: &str) -> Option<&'k str> {
    let rest = key.strip_prefix(namespace)?;
    let rest = if namespace.ends_with(['/', ':']) {
        rest
    } else {
        rest.strip_prefix(['/', ':'])?
    };
    (!rest.is_empty()).then_some(rest)
}

/// Rewrite a qualified claim key into another dialect's namespace
///
/// When `namespace` qualifies the key, everything after it is kept, nested
/// segments included. Otherwise the local part is whatever follows the last
/// `/` or `:`, and keys without either separator are entirely local. URN
/// dialects are joined with `:`, everything else with `/`, and a dialect id
/// that already ends in a separator is used as-is.
///
/// ```
/// use claimdialect::types::rewrite_namespace;
///
/// assert_eq!(rewrite_namespace("P/name", Some("P"), "D"), "D/name");
/// assert_eq!(rewrite_namespace("P/work/street", Some("P"), "D"), "D/work/street");
/// assert_eq!(
///     rewrite_namespace("http://wso2.org/claims/email", None, "urn:app:User"),
///     "urn:app:User:email"
/// );
/// ```
pub fn rewrite_namespace(key: &str, namespace: Option<&str>, dialect: &str) -> String {
    let local = namespace
        .and_then(|ns| local_part(key, ns))
        .unwrap_or_else(|| match key.rfind(['/', ':']) {
            Some(idx) => &key[idx + 1..],
            None => key,
        });

    if dialect.ends_with(['/', ':']) {
        format!("{}{}", dialect, local)
    } else if dialect.starts_with("urn:") {
        format!("{}:{}", dialect, local)
    } else {
        format!("{}/{}", dialect, local)
    }
}
