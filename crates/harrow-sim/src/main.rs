//! # Harrow Sim
//!
//! Headless arena that runs every ability kind against a scattered crowd
//! and logs what happened.
//!
//! Usage: `harrow-sim [config.toml] [seed]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;

use std::path::PathBuf;

use anyhow::{Context, Result};
use harrow_abilities::config::AbilityConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Config file used when no path is given.
const DEFAULT_CONFIG: &str = "harrow.toml";

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("harrow=info".parse()?))
        .init();

    info!("Harrow sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config_path = args.next().map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let seed = match args.next() {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("invalid seed {raw:?}"))?,
        None => app::DEFAULT_SEED,
    };

    let config = AbilityConfig::load_from(&config_path);
    let summary = app::simulate(&config, seed);

    info!(
        "Done after {:.2}s: {} activations, {} rejected, {} hits, {} kills, {} harvested",
        summary.elapsed,
        summary.activations,
        summary.rejections,
        summary.hits,
        summary.kills,
        summary.harvested
    );
    info!(
        "Player ended at {:.0} health, {} meter",
        summary.player_health, summary.player_meter
    );
    Ok(())
}
