//! Logging initialization
//!
//! The engine logs through `tracing`; the embedding application decides when
//! (and whether) to install a subscriber. This helper sets up the default
//! env-filtered registry.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "screencast_recorder=debug";

/// Install the default tracing registry. Call at most once per process.
pub fn init_logging() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    Ok(())
}
