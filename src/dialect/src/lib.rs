//! # Claim Dialect Resolution Engine
//!
//! Resolves namespaced claim identifiers to the canonical root claims of an
//! identity store.
//!
//! ## Features
//!
//! - **Multiple inheritance**: dialects merge mappings from any number of
//!   parents; later parents win on collisions, own mappings always win
//! - **Namespace override**: inherited keys can be re-prefixed with the
//!   inheriting dialect's identifier
//! - **Cycle detection**: path tracking during resolution plus a DFS/Kahn
//!   graph report at load time
//! - **Thread-safe caching**: DashMap-backed memoization per catalog snapshot
//! - **Atomic reload**: in-flight readers finish on the snapshot they started
//!   with
//!
//! ## Example
//!
//! ```rust
//! use claimdialect::{DialectCatalog, DialectDefinition, ResolverConfig, ResolvingService};
//!
//! let catalog = DialectCatalog::from_definitions(vec![
//!     DialectDefinition::new("P").with_mapping("P/name", "root/username"),
//!     DialectDefinition::new("D")
//!         .with_parent("P")
//!         .with_override_namespace(true),
//! ])?;
//!
//! let service = ResolvingService::with_catalog(catalog, ResolverConfig::default());
//! let d = service.get_mapping("D")?;
//!
//! assert_eq!(d.get("D/name"), Some("root/username"));
//! assert!(!d.contains_key("P/name"));
//! # Ok::<(), claimdialect::DialectError>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod resolver;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use catalog::{
    CatalogReport, CatalogSource, DialectCatalog, FileSource, Inherits, RawDialectEntry,
    StaticSource,
};
pub use config::ResolverConfig;
pub use error::{DialectError, Result};
pub use resolver::{CacheStats, ResolutionCache, ResolutionEngine};
pub use service::{BulkResolution, ResolvingService, ServiceState, SkippedDialect};
pub use types::{DialectDefinition, EffectiveMapping};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
