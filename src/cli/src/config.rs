//! CLI configuration loading and validation

use anyhow::{Context, Result};
use claimdialect::ResolverConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete CLI configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub catalog: CatalogSection,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub watch: WatchSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogSection {
    /// Catalog file (JSON or YAML)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchSection {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 { 5 }

impl CliConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read configuration file {:?}", path.as_ref()))?;

        let config: CliConfig = toml::from_str(&contents)
            .context("Failed to parse configuration file")?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.catalog.path.is_none() {
            anyhow::bail!("No catalog path configured (set [catalog] path or pass --catalog)");
        }

        if self.watch.interval_secs == 0 {
            anyhow::bail!("watch.interval_secs must be at least 1");
        }

        Ok(())
    }

    /// Catalog path, resolved against the current directory if relative
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog.path.as_ref().map(|path| {
            if path.is_absolute() {
                path.clone()
            } else {
                std::env::current_dir().unwrap_or_default().join(path)
            }
        })
    }
}
