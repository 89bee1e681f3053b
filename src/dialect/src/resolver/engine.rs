//! Resolution engine: depth-first merge of inherited claim mappings
//!
//! For a dialect `D` the effective mapping is built as:
//!
//! 1. return the cached mapping if `D` was already resolved
//! 2. push `D` onto the active path, failing if it is already there
//! 3. for each parent in declaration order, resolve it recursively and merge
//!    its mapping in; later parents overwrite earlier ones
//! 4. when `D` overrides the namespace, inherited keys are rewritten into
//!    `D`'s namespace as they are merged: the prefix of the parent, or of
//!    whichever catalog dialect qualifies the key, is replaced and the rest
//!    of the key is kept
//! 5. merge `D`'s own mappings last so they always win
//! 6. pop `D`, cache the result and return it

use super::cache::ResolutionCache;
use crate::catalog::DialectCatalog;
use crate::config::ResolverConfig;
use crate::error::{DialectError, Result};
use crate::types::{local_part, rewrite_namespace, DialectDefinition, EffectiveMapping};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolves dialects against one borrowed catalog snapshot
///
/// The engine holds no state of its own; the active path lives on the stack
/// of each `resolve` call, so one engine may be used from many threads.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionEngine<'a> {
    catalog: &'a DialectCatalog,
    cache: &'a ResolutionCache,
    config: &'a ResolverConfig,
}

impl<'a> ResolutionEngine<'a> {
    /// Create an engine over a catalog and its cache
    pub fn new(
        catalog: &'a DialectCatalog,
        cache: &'a ResolutionCache,
        config: &'a ResolverConfig,
    ) -> Self {
        Self {
            catalog,
            cache,
            config,
        }
    }

    /// Effective mapping of a dialect
    ///
    /// # Errors
    ///
    /// - `UnknownDialect` if the dialect is not in the catalog
    /// - `MissingParent` if any ancestor declares an absent parent
    /// - `CyclicInheritance` if the parent chain loops back on itself
    pub fn resolve(&self, dialect: &str) -> Result<Arc<EffectiveMapping>> {
        let definition = self
            .catalog
            .get(dialect)
            .ok_or_else(|| DialectError::UnknownDialect(dialect.to_string()))?;

        let mut path = Vec::new();
        self.resolve_on_path(definition, &mut path)
    }

    fn resolve_on_path(
        &self,
        definition: &'a DialectDefinition,
        path: &mut Vec<&'a str>,
    ) -> Result<Arc<EffectiveMapping>> {
        let id = definition.id.as_str();

        if self.config.cache_enabled {
            if let Some(cached) = self.cache.get(id) {
                trace!(dialect = id, "Effective mapping served from cache");
                return Ok(cached);
            }
        }

        if let Some(start) = path.iter().position(|p| *p == id) {
            let cycle = path[start..]
                .iter()
                .chain(std::iter::once(&id))
                .map(|p| p.to_string())
                .collect();
            return Err(DialectError::CyclicInheritance { cycle });
        }

        path.push(id);
        let merged = self.merge(definition, path);
        path.pop();
        let mapping = merged?;

        debug!(
            dialect = id,
            claims = mapping.len(),
            parents = definition.parents.len(),
            "Resolved effective mapping"
        );

        if self.config.cache_enabled {
            Ok(self.cache.put(id, mapping))
        } else {
            Ok(Arc::new(mapping))
        }
    }

    fn merge(
        &self,
        definition: &'a DialectDefinition,
        path: &mut Vec<&'a str>,
    ) -> Result<EffectiveMapping> {
        let mut result = BTreeMap::new();

        for parent_id in &definition.parents {
            let parent = self.catalog.get(parent_id).ok_or_else(|| DialectError::MissingParent {
                dialect: definition.id.clone(),
                parent: parent_id.clone(),
            })?;

            let inherited = self.resolve_on_path(parent, path)?;
            for (local, root) in inherited.iter() {
                let key = if definition.override_namespace {
                    let namespace = if local_part(local, parent_id).is_some() {
                        Some(parent_id.as_str())
                    } else {
                        self.catalog.namespace_of(local)
                    };
                    rewrite_namespace(local, namespace, &definition.id)
                } else {
                    local.to_string()
                };
                result.insert(key, root.to_string());
            }
        }

        for (local, root) in &definition.own_mappings {
            result.insert(local.clone(), root.clone());
        }

        Ok(EffectiveMapping::from(result))
    }
}
