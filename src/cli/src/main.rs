//! claimdialect - Claim dialect resolution CLI
//!
//! Loads a dialect catalog (JSON or YAML) and answers resolution queries:
//! - effective mapping of one dialect or of every dialect
//! - inheritance diagnostics (cycles, missing parents)
//! - single claim lookups
//! - long-running watch mode that reloads the catalog on change

use anyhow::{Context, Result};
use clap::Parser;
use claimdialect::{FileSource, ResolvingService};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod config;
mod watch;

use config::CliConfig;

/// Claim dialect resolution CLI
#[derive(Parser)]
#[command(name = "claimdialect")]
#[command(about = "Resolve claim dialects to root claims")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "CLAIMDIALECT_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog file (overrides config)
    #[arg(long, env = "CLAIMDIALECT_CATALOG")]
    catalog: Option<PathBuf>,

    /// Disable the resolution cache (overrides config)
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Print the effective mapping of one dialect
    Resolve {
        /// Dialect identifier
        dialect: String,
    },

    /// Print the effective mapping of every dialect with mappings
    All,

    /// Report cycles and missing parents; fails if any are found
    Check,

    /// Look up the root claim of one local claim
    Lookup {
        /// Dialect identifier
        dialect: String,

        /// Local claim identifier
        claim: String,
    },

    /// Reload the catalog whenever its file changes
    Watch {
        /// Poll interval in seconds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Serialize)]
struct ClaimLookup<'a> {
    dialect: &'a str,
    claim: &'a str,
    root_claim: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => {
            let config = CliConfig::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => CliConfig::default(),
    };

    // Apply CLI overrides
    if let Some(catalog) = cli.catalog {
        config.catalog.path = Some(catalog);
    }
    if cli.no_cache {
        config.resolver.cache_enabled = false;
    }
    if let Command::Watch { interval: Some(secs) } = &cli.command {
        config.watch.interval_secs = *secs;
    }

    // Validate configuration
    config.validate()?;
    let catalog_path = config
        .catalog_path()
        .context("No catalog path configured")?;

    let service = Arc::new(ResolvingService::new(config.resolver.clone()));
    let source = FileSource::new(&catalog_path);
    let report = service
        .load(&source)
        .with_context(|| format!("Failed to load catalog {:?}", catalog_path))?;

    match cli.command {
        Command::Resolve { dialect } => {
            let mapping = service.get_mapping(&dialect)?;
            print_json(&*mapping)?;
        }
        Command::All => {
            let bulk = service.get_all_mappings()?;
            print_json(&bulk)?;
        }
        Command::Check => {
            print_json(&report)?;
            if !report.is_clean() {
                anyhow::bail!(
                    "Catalog has {} cycle(s) and {} missing parent reference(s)",
                    report.cycles.len(),
                    report.missing_parents.len()
                );
            }
        }
        Command::Lookup { dialect, claim } => {
            let root_claim = service.resolve_claim(&dialect, &claim)?;
            print_json(&ClaimLookup {
                dialect: &dialect,
                claim: &claim,
                root_claim,
            })?;
        }
        Command::Watch { .. } => {
            let every = Duration::from_secs(config.watch.interval_secs);
            watch::watch(service, source, every).await?;
            info!("Watcher stopped");
        }
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
