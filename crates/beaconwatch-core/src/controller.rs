//! The sensing state machine.
//!
//! [`SensingController`] coordinates coarse and fine-grained sensing: it
//! keeps one main region monitored, ranges individual beacons while the
//! device is inside it, and grows a per-beacon sub-region for every newly
//! discovered beacon so that beacon keeps producing entry/exit events after
//! ranging stops.
//!
//! The controller reacts to [`LocationEvent`]s and issues
//! [`crate::location::LocationCommand`]s through its port; it owns the
//! discovery set and region registry exclusively and processes one event to
//! completion before the next.

use tracing::{debug, info, warn};

use crate::beacon::{BeaconIdentity, DiscoverySet};
use crate::config::Config;
use crate::error::Result;
use crate::location::{
    AuthorizationStatus, LocationCommand, LocationEvent, LocationPort, RegionState,
};
use crate::region::RegionRegistry;

/// Drives region monitoring and beacon ranging against a location service.
#[derive(Debug)]
pub struct SensingController<P: LocationPort> {
    port: P,
    registry: RegionRegistry,
    discovered: DiscoverySet,
    authorization: AuthorizationStatus,
    main_state: RegionState,
    ranging_active: bool,
}

impl<P: LocationPort> SensingController<P> {
    /// Build a controller from configuration and an exclusively owned port.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::InvalidBeaconUuid`] when the configured
    /// family UUID does not parse. Nothing can be monitored without one, so
    /// this is fatal at startup.
    pub fn new(config: &Config, port: P) -> Result<Self> {
        let registry = RegionRegistry::new(&config.beacon_uuid, &config.main_region_identifier)?;
        Ok(Self {
            port,
            registry,
            discovered: DiscoverySet::new(),
            authorization: AuthorizationStatus::NotDetermined,
            main_state: RegionState::Unknown,
            ranging_active: false,
        })
    }

    /// Request authorization and reset monitoring to a known-empty baseline.
    ///
    /// Region registrations persist across process restarts on some
    /// platforms, so every region the service still monitors is stopped,
    /// along with visit and significant-location-change monitoring. Call
    /// once at startup; main-region monitoring begins when the service
    /// reports [`AuthorizationStatus::AuthorizedAlways`].
    pub fn startup(&mut self) {
        self.port.send(LocationCommand::RequestAlwaysAuthorization);

        let leftover = self.port.monitored_regions();
        info!(count = leftover.len(), "resetting region monitoring");
        self.port.send(LocationCommand::StopMonitoringVisits);
        self.port
            .send(LocationCommand::StopMonitoringSignificantLocationChanges);
        for region in leftover {
            self.port.send(LocationCommand::StopMonitoring(region));
        }
        self.registry.reset();
    }

    /// Every beacon discovered this session.
    #[must_use]
    pub fn discovered(&self) -> &DiscoverySet {
        &self.discovered
    }

    /// The region registry, including the monitored mirror.
    #[must_use]
    pub fn registry(&self) -> &RegionRegistry {
        &self.registry
    }

    /// The most recently reported authorization status.
    #[must_use]
    pub fn authorization(&self) -> AuthorizationStatus {
        self.authorization
    }

    /// The most recent determination for the main region.
    #[must_use]
    pub fn main_region_state(&self) -> RegionState {
        self.main_state
    }

    /// Whether beacon ranging is currently active.
    #[must_use]
    pub fn is_ranging(&self) -> bool {
        self.ranging_active
    }

    /// Process one event from the location service.
    pub fn handle_event(&mut self, event: LocationEvent) {
        match event {
            LocationEvent::AuthorizationChanged(status) => self.on_authorization_changed(status),
            LocationEvent::RegionDetermined { region, state } => {
                self.on_region_determined(&region, state);
            }
            LocationEvent::MonitoringStarted { region } => self.on_monitoring_started(&region),
            LocationEvent::MonitoringFailed { region, message } => {
                self.on_monitoring_failed(region.as_deref(), &message);
            }
            LocationEvent::RegionEntered { region } => self.on_region_entered(&region),
            LocationEvent::RegionExited { region } => self.on_region_exited(&region),
            LocationEvent::BeaconsRanged { region, beacons } => {
                self.on_beacons_ranged(&region, beacons);
            }
            LocationEvent::RangingFailed { region, message } => {
                self.on_ranging_failed(&region, &message);
            }
        }
    }

    fn on_authorization_changed(&mut self, status: AuthorizationStatus) {
        info!(?status, "authorization changed");
        self.authorization = status;

        // Only always-on authorization permits background region monitoring.
        if status == AuthorizationStatus::AuthorizedAlways {
            self.start_monitoring_main();
        }
    }

    fn on_region_determined(&mut self, region: &str, state: RegionState) {
        debug!(region, ?state, "region state determined");

        // Determination is authoritative for ranging, and only for the main
        // region; sub-regions are monitored but never ranged.
        if region != self.registry.main_region().identifier {
            return;
        }
        self.main_state = state;

        match state {
            RegionState::Inside => {
                if !self.ranging_active {
                    self.ranging_active = true;
                    info!("inside main region, starting beacon ranging");
                    self.port.send(LocationCommand::StartRanging(
                        self.registry.main_region().clone(),
                    ));
                }
            }
            RegionState::Outside => {
                if self.ranging_active {
                    self.ranging_active = false;
                    info!("outside main region, stopping beacon ranging");
                    self.port.send(LocationCommand::StopRanging(
                        self.registry.main_region().clone(),
                    ));
                }
            }
            RegionState::Unknown => {}
        }
    }

    fn on_monitoring_started(&mut self, region: &str) {
        debug!(
            region,
            mirrored = self.registry.is_monitored(region),
            "monitoring started"
        );
    }

    fn on_monitoring_failed(&mut self, region: Option<&str>, message: &str) {
        match region {
            Some(identifier) => {
                warn!(region = identifier, error = message, "monitoring failed");
                self.registry.record_monitoring_stopped(identifier);
            }
            // Nothing safe to remove from the mirror without an identifier.
            None => warn!(error = message, "monitoring failed for unspecified region"),
        }
        self.heal_if_unmonitored();
    }

    fn on_region_entered(&mut self, region: &str) {
        if region == self.registry.main_region().identifier {
            info!("entered main region");
        } else {
            info!(region, "entered region");
        }
    }

    fn on_region_exited(&mut self, region: &str) {
        if region == self.registry.main_region().identifier {
            info!("exited main region");
        } else {
            info!(region, "exited region");
        }
        self.heal_if_unmonitored();
    }

    fn on_beacons_ranged(&mut self, region: &str, beacons: Vec<BeaconIdentity>) {
        debug!(
            region,
            ranged = beacons.len(),
            monitored = self.registry.monitored_count(),
            "ranged beacons"
        );

        for beacon in beacons {
            // Insert and sub-region start are one transaction: a `true`
            // return is the only trigger for monitoring, so a beacon can
            // never gain two sub-region registrations.
            if self.discovered.insert(beacon.clone()) {
                let sub = self.registry.sub_region_for(&beacon);
                info!(region = %sub.identifier, %beacon, "discovered beacon, monitoring sub-region");
                self.registry.record_monitoring_started(sub.clone());
                self.port.send(LocationCommand::StartMonitoring(sub));
            } else {
                debug!(%beacon, "beacon already discovered");
            }
        }
    }

    fn on_ranging_failed(&mut self, region: &str, message: &str) {
        warn!(region, error = message, "ranging failed");

        // Ranging is considered stopped; the next Inside determination for
        // the main region re-attempts it.
        if region == self.registry.main_region().identifier {
            self.ranging_active = false;
        }
    }

    /// Re-establish main-region monitoring when the mirror drains to zero.
    ///
    /// Runs within the event that emptied the mirror, so the re-request is
    /// issued before any later event is processed.
    fn heal_if_unmonitored(&mut self) {
        if self.registry.monitored_count() == 0 {
            info!("no regions monitored, re-establishing main region");
            self.start_monitoring_main();
        }
    }

    fn start_monitoring_main(&mut self) {
        let main = self.registry.main_region().clone();
        info!(region = %main.identifier, "start monitoring main region");
        self.registry.record_monitoring_started(main.clone());
        self.port.send(LocationCommand::StartMonitoring(main));
    }
}
