//! Resolving service: the public read API over the current catalog snapshot
//!
//! The service owns the catalog. Each installed catalog becomes an immutable
//! snapshot bundled with its own resolution cache; installing a new catalog
//! swaps the snapshot pointer atomically. Calls already running keep the
//! `Arc` of the old snapshot and finish against it, later calls see the new
//! snapshot with an empty cache.
//!
//! # Example
//!
//! ```rust
//! use claimdialect::{DialectCatalog, DialectDefinition, ResolverConfig, ResolvingService};
//!
//! let service = ResolvingService::new(ResolverConfig::default());
//! assert!(!service.is_ready());
//!
//! service.install(DialectCatalog::from_definitions(vec![
//!     DialectDefinition::new("scim").with_mapping("userName", "root/username"),
//!     DialectDefinition::new("app1")
//!         .with_mapping("email", "root/email")
//!         .with_parent("scim"),
//! ])?);
//!
//! let app1 = service.get_mapping("app1")?;
//! assert_eq!(app1.get("userName"), Some("root/username"));
//! assert_eq!(app1.get("email"), Some("root/email"));
//! # Ok::<(), claimdialect::DialectError>(())
//! ```

use crate::catalog::{CatalogReport, CatalogSource, DialectCatalog};
use crate::config::ResolverConfig;
use crate::error::{DialectError, Result};
use crate::resolver::{CacheStats, ResolutionCache, ResolutionEngine};
use crate::types::EffectiveMapping;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One installed catalog together with its cache
#[derive(Debug)]
struct Snapshot {
    catalog: DialectCatalog,
    cache: ResolutionCache,
    report: CatalogReport,
    version: u64,
}

impl Snapshot {
    fn engine<'a>(&'a self, config: &'a ResolverConfig) -> ResolutionEngine<'a> {
        ResolutionEngine::new(&self.catalog, &self.cache, config)
    }
}

/// Dialect skipped by [`ResolvingService::get_all_mappings`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDialect {
    /// Dialect identifier
    pub dialect: String,
    /// Why resolution failed
    pub reason: String,
}

/// Outcome of resolving every dialect in the catalog
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkResolution {
    /// Effective mapping per successfully resolved dialect
    pub mappings: BTreeMap<String, Arc<EffectiveMapping>>,
    /// Dialects whose resolution failed
    pub skipped: Vec<SkippedDialect>,
}

impl BulkResolution {
    /// Whether every candidate dialect resolved
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Lifecycle of the service as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceState {
    /// No catalog installed yet
    Unloaded,
    /// A catalog is installed and serving reads
    Loaded {
        /// Install counter of the current snapshot
        version: u64,
    },
}

/// Read API for effective claim mappings
///
/// Construct one at startup and share it (`Arc<ResolvingService>`) with
/// every component that needs claim resolution.
#[derive(Debug)]
pub struct ResolvingService {
    config: ResolverConfig,
    current: RwLock<Option<Arc<Snapshot>>>,
    installs: AtomicU64,
}

impl ResolvingService {
    /// Create a service with no catalog
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            current: RwLock::new(None),
            installs: AtomicU64::new(0),
        }
    }

    /// Create a service and install a catalog
    pub fn with_catalog(catalog: DialectCatalog, config: ResolverConfig) -> Self {
        let service = Self::new(config);
        service.install(catalog);
        service
    }

    /// Configuration in effect
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Load a catalog from a source and install it
    ///
    /// On error the previously installed snapshot, if any, stays in place.
    pub fn load(&self, source: &dyn CatalogSource) -> Result<CatalogReport> {
        let entries = source.load()?;
        let catalog = DialectCatalog::from_entries(entries)?;
        info!(source = %source.describe(), dialects = catalog.len(), "Loaded dialect catalog");
        Ok(self.install(catalog))
    }

    /// Reload from a source after a "catalog changed" event
    pub fn reload(&self, source: &dyn CatalogSource) -> Result<CatalogReport> {
        debug!(source = %source.describe(), "Catalog reload requested");
        self.load(source)
    }

    /// Swap in a new catalog snapshot
    ///
    /// The outgoing snapshot's cache is invalidated once the swap is done.
    pub fn install(&self, catalog: DialectCatalog) -> CatalogReport {
        let report = catalog.diagnose();
        for cycle in &report.cycles {
            warn!(cycle = %cycle.join(" -> "), "Cyclic dialect inheritance");
        }
        for edge in &report.missing_parents {
            warn!(dialect = %edge.dialect, parent = %edge.parent, "Dialect inherits from a missing parent");
        }

        let version = self.installs.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = Arc::new(Snapshot {
            catalog,
            cache: ResolutionCache::new(),
            report: report.clone(),
            version,
        });

        let previous = self.current.write().replace(Arc::clone(&snapshot));
        if let Some(previous) = previous {
            previous.cache.invalidate_all();
        }

        info!(
            version,
            dialects = report.dialects,
            cycles = report.cycles.len(),
            missing_parents = report.missing_parents.len(),
            "Installed dialect catalog"
        );

        if self.config.warm_on_load {
            let bulk = self.resolve_all(&snapshot);
            debug!(
                version,
                resolved = bulk.mappings.len(),
                skipped = bulk.skipped.len(),
                "Warmed resolution cache"
            );
        }

        report
    }

    fn snapshot(&self) -> Result<Arc<Snapshot>> {
        self.current.read().clone().ok_or(DialectError::NotReady)
    }

    /// Whether a catalog is installed
    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ServiceState {
        match self.current.read().as_ref() {
            Some(snapshot) => ServiceState::Loaded {
                version: snapshot.version,
            },
            None => ServiceState::Unloaded,
        }
    }

    /// Effective mapping of one dialect
    ///
    /// # Errors
    ///
    /// `NotReady` before the first install, otherwise whatever the engine
    /// reports (`UnknownDialect`, `MissingParent`, `CyclicInheritance`).
    pub fn get_mapping(&self, dialect: &str) -> Result<Arc<EffectiveMapping>> {
        let snapshot = self.snapshot()?;
        snapshot.engine(&self.config).resolve(dialect)
    }

    /// Effective mapping of every dialect that declares mappings of its own
    ///
    /// Dialects are resolved parents first. A dialect that fails is recorded
    /// in `skipped` and logged; it never aborts the rest. An empty catalog
    /// yields an empty result.
    ///
    /// # Errors
    ///
    /// Only `NotReady`, when no catalog has been installed.
    pub fn get_all_mappings(&self) -> Result<BulkResolution> {
        let snapshot = self.snapshot()?;
        Ok(self.resolve_all(&snapshot))
    }

    fn resolve_all(&self, snapshot: &Snapshot) -> BulkResolution {
        let mut bulk = BulkResolution::default();

        if snapshot.catalog.is_empty() {
            debug!(version = snapshot.version, "Catalog is empty, nothing to resolve");
            return bulk;
        }

        let engine = snapshot.engine(&self.config);
        let candidates = snapshot
            .report
            .order
            .iter()
            .chain(snapshot.report.blocked.iter());

        for dialect in candidates {
            let has_mappings = snapshot
                .catalog
                .get(dialect)
                .map(|d| d.has_mappings())
                .unwrap_or(false);
            if !has_mappings {
                continue;
            }

            match engine.resolve(dialect) {
                Ok(mapping) => {
                    bulk.mappings.insert(dialect.clone(), mapping);
                }
                Err(err) => {
                    warn!(dialect = %dialect, error = %err, "Skipping unresolvable dialect");
                    bulk.skipped.push(SkippedDialect {
                        dialect: dialect.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        bulk
    }

    /// Root claim for one local claim of a dialect
    pub fn resolve_claim(&self, dialect: &str, local_claim: &str) -> Result<Option<String>> {
        let mapping = self.get_mapping(dialect)?;
        Ok(mapping.get(local_claim).map(str::to_string))
    }

    /// Local claims of a dialect that map to a root claim
    pub fn reverse_lookup(&self, dialect: &str, root_claim: &str) -> Result<Vec<String>> {
        let mapping = self.get_mapping(dialect)?;
        Ok(mapping
            .locals_for_root(root_claim)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Dialect identifiers of the current snapshot, in catalog order
    pub fn dialect_ids(&self) -> Result<Vec<String>> {
        let snapshot = self.snapshot()?;
        Ok(snapshot.catalog.ids().map(str::to_string).collect())
    }

    /// Graph diagnostics computed when the current snapshot was installed
    pub fn report(&self) -> Result<CatalogReport> {
        Ok(self.snapshot()?.report.clone())
    }

    /// Cache counters of the current snapshot
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.current.read().as_ref().map(|s| s.cache.stats())
    }

    /// Drop every cached mapping of the current snapshot
    pub fn invalidate_cache(&self) {
        if let Some(snapshot) = self.current.read().as_ref() {
            snapshot.cache.invalidate_all();
        }
    }

    /// Install counter of the current snapshot
    pub fn snapshot_version(&self) -> Option<u64> {
        self.current.read().as_ref().map(|s| s.version)
    }
}

impl Default for ResolvingService {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}
