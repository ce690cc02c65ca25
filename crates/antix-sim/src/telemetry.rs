//! Tracing setup for the runner.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,antix_world=info,antix_sim=debug";

/// Install the global subscriber. `RUST_LOG` overrides the default filter;
/// `json` switches output to JSON lines.
pub fn init_telemetry(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_target(true)))
        .with((!json).then(|| fmt::layer().with_target(true)))
        .try_init()?;

    info!(json, "Telemetry initialized");
    Ok(())
}
