//! Simulated location service.
//!
//! Stands in for the platform location backend during development. The
//! service consumes controller commands and produces a deterministic
//! lifecycle: authorization grant, monitoring confirmations, an inside
//! determination for the main region, overlapping ranging passes, then the
//! walk back out and a revocation wave that drains every registration (which
//! the controller is expected to recover from by re-establishing the main
//! region).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;
use uuid::Uuid;

use beaconwatch_core::{
    AuthorizationStatus, BeaconIdentity, LocationCommand, LocationEvent, LocationPort,
    RegionDescriptor, RegionKind, RegionState,
};

type MonitoredMap = Arc<Mutex<HashMap<String, RegionDescriptor>>>;

const AUTHORIZATION_DELAY: Duration = Duration::from_millis(200);
const REGION_ENTRY_DELAY: Duration = Duration::from_millis(300);
const RANGING_PASS_INTERVAL: Duration = Duration::from_millis(500);
const DWELL_BEFORE_EXIT: Duration = Duration::from_secs(2);
const REVOCATION_DELAY: Duration = Duration::from_millis(500);

/// Port half handed to the controller.
pub struct SimPort {
    commands_tx: UnboundedSender<LocationCommand>,
    monitored: MonitoredMap,
}

impl LocationPort for SimPort {
    fn monitored_regions(&self) -> Vec<RegionDescriptor> {
        self.monitored.lock().unwrap().values().cloned().collect()
    }

    fn send(&mut self, command: LocationCommand) {
        // The receiver only goes away on shutdown.
        let _ = self.commands_tx.send(command);
    }
}

/// The simulated service task.
pub struct SimulatedLocationService {
    family: Uuid,
    events_tx: UnboundedSender<LocationEvent>,
    commands_rx: UnboundedReceiver<LocationCommand>,
    monitored: MonitoredMap,
    main_walked: bool,
}

impl SimulatedLocationService {
    /// Spawn the service; returns the port for the controller.
    pub fn spawn(family: Uuid, events_tx: UnboundedSender<LocationEvent>) -> SimPort {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let monitored: MonitoredMap = Arc::new(Mutex::new(HashMap::new()));

        let service = Self {
            family,
            events_tx,
            commands_rx,
            monitored: Arc::clone(&monitored),
            main_walked: false,
        };
        tokio::spawn(service.run());

        SimPort {
            commands_tx,
            monitored,
        }
    }

    async fn run(mut self) {
        while let Some(command) = self.commands_rx.recv().await {
            self.handle_command(command);
        }
    }

    /// React to one controller command. Never blocks the command loop:
    /// anything that takes simulated time runs on its own task, so sub-region
    /// registrations issued mid-walk are processed as they arrive.
    fn handle_command(&mut self, command: LocationCommand) {
        debug!(?command, "simulation received command");
        match command {
            LocationCommand::RequestAlwaysAuthorization => {
                self.emit_later(
                    AUTHORIZATION_DELAY,
                    vec![LocationEvent::AuthorizationChanged(
                        AuthorizationStatus::AuthorizedAlways,
                    )],
                );
            }
            LocationCommand::StopMonitoringVisits
            | LocationCommand::StopMonitoringSignificantLocationChanges
            | LocationCommand::StopRanging(_) => {}
            LocationCommand::StartMonitoring(region) => self.on_start_monitoring(region),
            LocationCommand::StopMonitoring(region) => {
                self.monitored.lock().unwrap().remove(&region.identifier);
            }
            LocationCommand::StartRanging(region) => self.spawn_range_walk(region.identifier),
        }
    }

    fn on_start_monitoring(&mut self, region: RegionDescriptor) {
        let identifier = region.identifier.clone();
        let is_main = region.kind == RegionKind::Main;
        self.monitored
            .lock()
            .unwrap()
            .insert(identifier.clone(), region);
        self.emit(LocationEvent::MonitoringStarted {
            region: identifier.clone(),
        });

        // Walk the device into the main region once per process; later main
        // registrations (self-healing) are confirmed without a new walk.
        if is_main && !self.main_walked {
            self.main_walked = true;
            self.emit_later(
                REGION_ENTRY_DELAY,
                vec![
                    LocationEvent::RegionEntered {
                        region: identifier.clone(),
                    },
                    LocationEvent::RegionDetermined {
                        region: identifier,
                        state: RegionState::Inside,
                    },
                ],
            );
        }
    }

    /// Ranging passes with overlapping sightings, the walk back out, then a
    /// revocation wave that drops every registration.
    fn spawn_range_walk(&self, main: String) {
        let tx = self.events_tx.clone();
        let monitored = Arc::clone(&self.monitored);
        let family = self.family;

        tokio::spawn(async move {
            let beacon = |major: u16, minor: u16| BeaconIdentity::new(family, major, minor);
            let passes = [
                vec![beacon(1, 1), beacon(1, 2)],
                vec![beacon(1, 1), beacon(1, 2), beacon(2, 1)],
                vec![beacon(2, 1), beacon(2, 2)],
            ];
            for beacons in passes {
                tokio::time::sleep(RANGING_PASS_INTERVAL).await;
                let _ = tx.send(LocationEvent::BeaconsRanged {
                    region: main.clone(),
                    beacons,
                });
            }

            tokio::time::sleep(DWELL_BEFORE_EXIT).await;
            let _ = tx.send(LocationEvent::RegionDetermined {
                region: main.clone(),
                state: RegionState::Outside,
            });
            let _ = tx.send(LocationEvent::RegionExited {
                region: main.clone(),
            });

            // The platform drops every registration; the controller notices
            // the empty set and re-establishes the main region.
            tokio::time::sleep(REVOCATION_DELAY).await;
            let dropped: Vec<String> = monitored
                .lock()
                .unwrap()
                .drain()
                .map(|(identifier, _)| identifier)
                .collect();
            for identifier in dropped {
                if identifier != main {
                    let _ = tx.send(LocationEvent::RegionExited {
                        region: identifier.clone(),
                    });
                }
                let _ = tx.send(LocationEvent::MonitoringFailed {
                    region: Some(identifier),
                    message: "registration dropped by simulation".to_string(),
                });
            }
        });
    }

    fn emit(&self, event: LocationEvent) {
        let _ = self.events_tx.send(event);
    }

    fn emit_later(&self, delay: Duration, events: Vec<LocationEvent>) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for event in events {
                let _ = tx.send(event);
            }
        });
    }
}
