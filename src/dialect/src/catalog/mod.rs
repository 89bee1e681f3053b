//! Dialect catalog
//!
//! The catalog is the immutable snapshot of every dialect definition loaded
//! from a [`CatalogSource`]. It is owned by the resolving service; the engine
//! and cache only ever borrow it.
//!
//! # Example
//!
//! ```rust
//! use claimdialect::catalog::{DialectCatalog, RawDialectEntry, Inherits};
//!
//! let mut scim = RawDialectEntry::new("scim");
//! scim.mappings = Some([("userName".to_string(), Some("root/username".to_string()))].into());
//!
//! let mut app = RawDialectEntry::new("app1");
//! app.inherits = Some(Inherits::One("scim".to_string()));
//!
//! let catalog = DialectCatalog::from_entries(vec![scim, app]).unwrap();
//! assert_eq!(catalog.len(), 2);
//! assert!(catalog.diagnose().is_clean());
//! ```

pub mod graph;
pub mod source;

pub use graph::{GraphError, InheritanceGraph, MissingEdge};
pub use source::{CatalogSource, FileSource, Inherits, RawDialectEntry, SourceFormat, StaticSource};

use crate::error::{DialectError, Result};
use crate::types::DialectDefinition;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Immutable set of dialect definitions keyed by identifier
///
/// Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct DialectCatalog {
    dialects: HashMap<String, DialectDefinition>,
    order: Vec<String>,
}

impl DialectCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-normalized definitions
    ///
    /// # Errors
    ///
    /// Returns an error if a definition is invalid or an identifier repeats.
    pub fn from_definitions(definitions: Vec<DialectDefinition>) -> Result<Self> {
        let mut catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition)?;
        }
        Ok(catalog)
    }

    /// Normalize raw source entries into a catalog
    ///
    /// - identifiers and parent ids are trimmed, blank parents are dropped
    /// - null or blank claim keys/values are dropped with a warning
    /// - a claim key that collides with an earlier one once trimmed is
    ///   dropped with a warning; the first in key order is kept
    /// - an absent `inherits` means no parents, an absent override flag means
    ///   `false`
    ///
    /// # Errors
    ///
    /// Returns an error for a blank dialect identifier or a duplicate one.
    pub fn from_entries(entries: Vec<RawDialectEntry>) -> Result<Self> {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(Self::normalize(entry)?)?;
        }
        Ok(catalog)
    }

    fn normalize(entry: RawDialectEntry) -> Result<DialectDefinition> {
        let id = entry.dialect_uri.trim().to_string();
        if id.is_empty() {
            return Err(DialectError::InvalidDefinition(
                "Catalog entry has a blank dialectURI".to_string(),
            ));
        }

        let mut own_mappings = BTreeMap::new();
        for (local, root) in entry.mappings.unwrap_or_default() {
            let local = local.trim();
            match root.as_deref().map(str::trim) {
                Some(root) if !local.is_empty() && !root.is_empty() => {
                    if let Some(kept) = own_mappings.get(local) {
                        warn!(
                            dialect = %id,
                            claim = %local,
                            kept = %kept,
                            dropped = %root,
                            "Dropping claim mapping that duplicates another after trimming"
                        );
                        continue;
                    }
                    own_mappings.insert(local.to_string(), root.to_string());
                }
                _ => {
                    warn!(dialect = %id, claim = %local, "Dropping blank claim mapping");
                }
            }
        }

        let parents = entry
            .inherits
            .map(Inherits::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(DialectDefinition {
            id,
            own_mappings,
            parents,
            override_namespace: entry.override_dialect_uri.unwrap_or(false),
        })
    }

    fn insert(&mut self, definition: DialectDefinition) -> Result<()> {
        definition.validate()?;

        if self.dialects.contains_key(&definition.id) {
            return Err(DialectError::DuplicateDialect(definition.id));
        }

        self.order.push(definition.id.clone());
        self.dialects.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Look up a dialect definition
    pub fn get(&self, id: &str) -> Option<&DialectDefinition> {
        self.dialects.get(id)
    }

    /// Whether the dialect exists
    pub fn contains(&self, id: &str) -> bool {
        self.dialects.contains_key(id)
    }

    /// Number of dialects
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no dialects are loaded
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Dialect identifiers in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Definitions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &DialectDefinition> {
        self.order.iter().filter_map(|id| self.dialects.get(id))
    }

    /// Dialect whose identifier qualifies a claim key
    ///
    /// Tries the longest prefix first, so `http://idp/claims/work/street`
    /// prefers a dialect `http://idp/claims/work` over `http://idp/claims`.
    pub fn namespace_of(&self, key: &str) -> Option<&str> {
        key.char_indices()
            .rev()
            .filter(|(idx, c)| (*c == '/' || *c == ':') && idx + 1 < key.len())
            .find_map(|(idx, _)| {
                self.dialects
                    .get_key_value(&key[..=idx])
                    .or_else(|| self.dialects.get_key_value(&key[..idx]))
                    .map(|(id, _)| id.as_str())
            })
    }

    /// Build the inheritance graph for this catalog
    pub fn graph(&self) -> InheritanceGraph {
        InheritanceGraph::from_catalog(self)
    }

    /// Analyse the inheritance graph without resolving anything
    pub fn diagnose(&self) -> CatalogReport {
        let graph = self.graph();
        let (order, blocked) = graph.partial_order();
        let cycles = if blocked.is_empty() {
            Vec::new()
        } else {
            graph.detect_cycles()
        };

        CatalogReport {
            dialects: self.len(),
            order,
            blocked,
            cycles,
            missing_parents: graph.missing_parents().to_vec(),
        }
    }
}

/// Result of [`DialectCatalog::diagnose`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogReport {
    /// Number of dialects in the catalog
    pub dialects: usize,

    /// Parents-first order of every dialect not blocked by a cycle
    pub order: Vec<String>,

    /// Dialects on, or inheriting from, a cycle
    pub blocked: Vec<String>,

    /// Every cycle, first dialect repeated at the end
    pub cycles: Vec<Vec<String>>,

    /// Parent references pointing outside the catalog
    pub missing_parents: Vec<MissingEdge>,
}

impl CatalogReport {
    /// Whether the catalog has neither cycles nor dangling parents
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty() && self.missing_parents.is_empty()
    }
}
