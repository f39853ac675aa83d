//! # beaconwatch-daemon
//!
//! Headless host for the beaconwatch sensing state machine.
//!
//! This binary provides:
//! - Structured logging to file and stdout
//! - Configuration loading
//! - The single-consumer event loop driving the sensing controller
//! - A simulated location service standing in for the platform backend
//!
//! ## Running
//!
//! ```bash
//! # Development
//! cargo run --package beaconwatch-daemon
//!
//! # Production
//! BEACONWATCH_ENV=production ./beaconwatch-daemon
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use beaconwatch_core::Config;
use tracing::info;

mod logging;
mod runtime;
mod sim;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init()?;

    info!("Starting beaconwatch-daemon");

    let config = Config::load_or_default()?;
    info!(
        beacon_uuid = %config.beacon_uuid,
        main_region = %config.main_region_identifier,
        "configuration loaded"
    );

    runtime::run(&config).await
}
