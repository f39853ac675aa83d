//! Single-consumer event loop hosting the sensing controller.
//!
//! Event producers may run on any task; delivery is serialized through one
//! queue, so the controller processes each event to completion before the
//! next and its state needs no locking.

use beaconwatch_core::{Config, SensingController};
use tokio::sync::mpsc;
use tracing::info;

use crate::sim::SimulatedLocationService;

/// Run the daemon until ctrl-c or until the event source goes away.
///
/// # Errors
///
/// Returns an error when the configured beacon UUID is invalid.
pub async fn run(config: &Config) -> anyhow::Result<()> {
    let family = config.family_uuid()?;
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let port = SimulatedLocationService::spawn(family, events_tx);

    let mut controller = SensingController::new(config, port)?;
    controller.startup();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            maybe_event = events_rx.recv() => match maybe_event {
                Some(event) => controller.handle_event(event),
                None => break,
            },
            _ = &mut ctrl_c => {
                info!("shutdown requested");
                break;
            }
        }
    }

    info!(
        discovered = controller.discovered().len(),
        monitored = controller.registry().monitored_count(),
        "stopping"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use beaconwatch_core::AuthorizationStatus;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_lifecycle_reaches_steady_state() {
        let config = Config::default();
        let family = config.family_uuid().unwrap();
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let port = SimulatedLocationService::spawn(family, events_tx);

        let mut controller = SensingController::new(&config, port).unwrap();
        controller.startup();

        // Drain events until the simulation goes quiet; paused time
        // auto-advances through the simulation's sleeps.
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_secs(60), events_rx.recv()).await
        {
            controller.handle_event(event);
        }

        assert_eq!(
            controller.authorization(),
            AuthorizationStatus::AuthorizedAlways
        );
        // Four distinct beacons across three overlapping ranging passes.
        assert_eq!(controller.discovered().len(), 4);
        assert!(!controller.is_ranging());
        // The revocation wave drained everything; the controller healed by
        // re-establishing the main region.
        assert_eq!(controller.registry().monitored_count(), 1);
        assert!(controller.registry().is_monitored("MainRegion"));
    }
}
