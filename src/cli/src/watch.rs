//! Catalog file watcher
//!
//! Polls the catalog file's modification time and reloads the service when
//! it changes. A reload that fails leaves the previous snapshot serving.

use anyhow::{Context, Result};
use claimdialect::{FileSource, ResolvingService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Tracks the last observed modification time of a file
#[derive(Debug)]
pub struct ModificationTracker {
    path: PathBuf,
    last_seen: Option<SystemTime>,
}

impl ModificationTracker {
    /// Start tracking, recording the current modification time
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let last_seen = Some(modified(&path)?);
        Ok(Self { path, last_seen })
    }

    /// Whether the file changed since the last call
    pub fn poll(&mut self) -> Result<bool> {
        let current = modified(&self.path)?;
        let changed = self.last_seen != Some(current);
        self.last_seen = Some(current);
        Ok(changed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn modified(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to stat catalog file {:?}", path))
}

/// Poll the catalog file until Ctrl+C
pub async fn watch(service: Arc<ResolvingService>, source: FileSource, every: Duration) -> Result<()> {
    let mut tracker = ModificationTracker::new(source.path())?;
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(path = ?tracker.path(), interval_secs = every.as_secs(), "Watching dialect catalog");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match tracker.poll() {
                    Ok(true) => reload(&service, &source),
                    Ok(false) => debug!("Catalog unchanged"),
                    Err(e) => warn!("Catalog file unavailable: {:#}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C)");
                break;
            }
        }
    }

    Ok(())
}

fn reload(service: &ResolvingService, source: &FileSource) {
    match service.reload(source) {
        Ok(report) => {
            if report.is_clean() {
                info!(version = ?service.snapshot_version(), "Catalog reloaded");
            } else {
                warn!(
                    cycles = report.cycles.len(),
                    missing_parents = report.missing_parents.len(),
                    "Catalog reloaded with inheritance defects"
                );
            }
        }
        Err(e) => error!("Catalog reload failed, keeping previous snapshot: {}", e),
    }
}
