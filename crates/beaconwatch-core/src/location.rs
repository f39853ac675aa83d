//! Boundary with the platform location service.
//!
//! Region monitoring and beacon ranging are performed by an external
//! collaborator (the platform's location subsystem). This module defines the
//! vocabulary that crosses that boundary: inbound events, outbound commands,
//! and the [`LocationPort`] trait the controller issues commands through.
//! The trait seam keeps the core testable without any platform runtime.

use serde::{Deserialize, Serialize};

use crate::beacon::BeaconIdentity;
use crate::region::RegionDescriptor;

/// Authorization granted by the user for location sensing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    NotDetermined,
    /// Sensing allowed in foreground and background.
    AuthorizedAlways,
    /// Sensing allowed only while the app is in active use.
    AuthorizedWhenInUse,
    /// The user declined.
    Denied,
    /// Sensing is blocked by device policy.
    Restricted,
}

/// Whether the device is inside or outside a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionState {
    /// The service has not determined a state for this cycle.
    Unknown,
    /// The device is inside the region.
    Inside,
    /// The device is outside the region.
    Outside,
}

/// Events delivered by the location service.
///
/// Events arrive one at a time and are processed to completion before the
/// next is delivered. Regions are referenced by identifier; the service
/// already holds the full descriptor from the start command that created
/// the registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationEvent {
    /// The user granted or revoked sensing authorization. May re-fire when
    /// the user changes settings.
    AuthorizationChanged(AuthorizationStatus),

    /// The service determined whether the device is inside a region.
    RegionDetermined {
        /// Region identifier.
        region: String,
        /// Determined state.
        state: RegionState,
    },

    /// The service confirmed that monitoring a region has begun.
    MonitoringStarted {
        /// Region identifier.
        region: String,
    },

    /// The service could not start or continue monitoring a region.
    MonitoringFailed {
        /// Region identifier, when the service reported one.
        region: Option<String>,
        /// Failure description.
        message: String,
    },

    /// The device crossed into a monitored region.
    RegionEntered {
        /// Region identifier.
        region: String,
    },

    /// The device crossed out of a monitored region.
    RegionExited {
        /// Region identifier.
        region: String,
    },

    /// One ranging pass completed inside a region.
    BeaconsRanged {
        /// Region the beacons were ranged in.
        region: String,
        /// Every beacon seen in this pass; repeats across passes are normal.
        beacons: Vec<BeaconIdentity>,
    },

    /// The service could not range beacons within a region.
    RangingFailed {
        /// Region identifier.
        region: String,
        /// Failure description.
        message: String,
    },
}

/// Commands issued to the location service.
///
/// Fire-and-forget: none of these block, and their outcomes come back as
/// [`LocationEvent`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationCommand {
    /// Ask the user for always-on sensing authorization.
    RequestAlwaysAuthorization,
    /// Stop visit monitoring left over from a previous process.
    StopMonitoringVisits,
    /// Stop significant-location-change monitoring left over from a
    /// previous process.
    StopMonitoringSignificantLocationChanges,
    /// Begin monitoring a region. Idempotent at the service.
    StartMonitoring(RegionDescriptor),
    /// Stop monitoring a region.
    StopMonitoring(RegionDescriptor),
    /// Begin continuous beacon ranging within a region.
    StartRanging(RegionDescriptor),
    /// Stop beacon ranging within a region.
    StopRanging(RegionDescriptor),
}

/// Command sink offered by the location service.
pub trait LocationPort {
    /// Regions the service is currently monitoring.
    ///
    /// May be non-empty before this process ever issued a start command:
    /// region registrations persist across restarts on some platforms.
    fn monitored_regions(&self) -> Vec<RegionDescriptor>;

    /// Issue a command. Does not block; failures surface as events.
    fn send(&mut self, command: LocationCommand);
}

/// Port double that records every command for inspection.
#[cfg(any(test, feature = "mock-location"))]
#[derive(Debug, Default)]
pub struct RecordingPort {
    /// Commands in issue order.
    pub commands: Vec<LocationCommand>,
    /// Snapshot returned by [`LocationPort::monitored_regions`].
    pub persisted: Vec<RegionDescriptor>,
}

#[cfg(any(test, feature = "mock-location"))]
impl RecordingPort {
    /// Create a port with nothing monitored.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a port that reports `regions` as already monitored, as a
    /// platform that persisted registrations across a restart would.
    #[must_use]
    pub fn with_persisted(regions: Vec<RegionDescriptor>) -> Self {
        Self {
            commands: Vec::new(),
            persisted: regions,
        }
    }

    /// Discard recorded commands.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// How many `StartMonitoring` commands were issued for `identifier`.
    #[must_use]
    pub fn monitoring_starts_for(&self, identifier: &str) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, LocationCommand::StartMonitoring(r) if r.identifier == identifier))
            .count()
    }

    /// How many `StartRanging` commands were issued for `identifier`.
    #[must_use]
    pub fn ranging_starts_for(&self, identifier: &str) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, LocationCommand::StartRanging(r) if r.identifier == identifier))
            .count()
    }

    /// How many `StopRanging` commands were issued for `identifier`.
    #[must_use]
    pub fn ranging_stops_for(&self, identifier: &str) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, LocationCommand::StopRanging(r) if r.identifier == identifier))
            .count()
    }
}

#[cfg(any(test, feature = "mock-location"))]
impl LocationPort for RecordingPort {
    fn monitored_regions(&self) -> Vec<RegionDescriptor> {
        self.persisted.clone()
    }

    fn send(&mut self, command: LocationCommand) {
        self.commands.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_port_counts_by_identifier() {
        let registry =
            crate::region::RegionRegistry::new("90dc5409-c9f4-4854-bc38-94367885850e", "MainRegion")
                .unwrap();
        let main = registry.main_region().clone();

        let mut port = RecordingPort::new();
        port.send(LocationCommand::StartMonitoring(main.clone()));
        port.send(LocationCommand::StartRanging(main.clone()));
        port.send(LocationCommand::StopRanging(main));

        assert_eq!(port.monitoring_starts_for("MainRegion"), 1);
        assert_eq!(port.ranging_starts_for("MainRegion"), 1);
        assert_eq!(port.ranging_stops_for("MainRegion"), 1);
        assert_eq!(port.monitoring_starts_for("SubRegion-1-1"), 0);

        port.clear();
        assert!(port.commands.is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = LocationEvent::MonitoringFailed {
            region: Some("SubRegion-1-1".into()),
            message: "too many regions".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: LocationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
