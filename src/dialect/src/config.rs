//! Resolver configuration

use serde::{Deserialize, Serialize};

/// Tuning knobs for the resolving service
///
/// Deserializable so it can sit directly in an application's config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Memoize effective mappings until the next reload
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Resolve every dialect right after a catalog is installed
    #[serde(default)]
    pub warm_on_load: bool,
}

fn default_true() -> bool { true }

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_true(),
            warm_on_load: false,
        }
    }
}

impl ResolverConfig {
    /// Enable or disable memoization
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Enable or disable eager resolution on install
    pub fn with_warm_on_load(mut self, warm: bool) -> Self {
        self.warm_on_load = warm;
        self
    }
}
