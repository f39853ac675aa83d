//! Region descriptors and monitored-region bookkeeping.
//!
//! The monitoring hierarchy has one coarse main region covering the whole
//! beacon family and one sub-region per discovered beacon. The registry owns
//! the main-region singleton and mirrors which regions are currently active
//! with the location service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::beacon::BeaconIdentity;
use crate::error::{Error, Result};

/// Whether a region is the coarse family region or a per-beacon one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionKind {
    /// The single always-monitored region covering the whole family.
    Main,
    /// A region covering exactly one discovered beacon.
    Sub,
}

/// What a region matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionScope {
    /// Every beacon advertising the family UUID.
    Family {
        /// The family UUID.
        uuid: Uuid,
    },
    /// One specific beacon.
    Beacon {
        /// The family UUID.
        uuid: Uuid,
        /// Group number.
        major: u16,
        /// Individual number.
        minor: u16,
    },
}

/// A region registered (or registerable) with the location service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    /// Identifier the location service keys callbacks by.
    pub identifier: String,

    /// Main or per-beacon region.
    pub kind: RegionKind,

    /// What the region matches.
    pub scope: RegionScope,

    /// Deliver an event when the device enters the region.
    pub notify_on_entry: bool,

    /// Deliver an event when the device exits the region.
    pub notify_on_exit: bool,

    /// Deliver a state determination when the display turns on.
    pub notify_on_display: bool,
}

/// Owns the main-region configuration and the monitored-region mirror.
///
/// The mirror tracks which regions this process believes are active with the
/// location service: regions are recorded when a start command is issued,
/// re-confirmed when the service acknowledges, and removed when monitoring
/// fails. The self-healing rule in the controller keys off this mirror.
#[derive(Debug)]
pub struct RegionRegistry {
    main: RegionDescriptor,
    monitored: HashMap<String, RegionDescriptor>,
}

impl RegionRegistry {
    /// Build a registry for a beacon family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBeaconUuid`] when `family_uuid` is not a valid
    /// UUID string. This is fatal at startup: no region can be described
    /// without a family UUID.
    pub fn new(family_uuid: &str, main_identifier: &str) -> Result<Self> {
        let uuid = family_uuid
            .parse::<Uuid>()
            .map_err(|source| Error::InvalidBeaconUuid {
                value: family_uuid.to_string(),
                source,
            })?;

        let main = RegionDescriptor {
            identifier: main_identifier.to_string(),
            kind: RegionKind::Main,
            scope: RegionScope::Family { uuid },
            notify_on_entry: true,
            notify_on_exit: true,
            notify_on_display: true,
        };

        Ok(Self {
            main,
            monitored: HashMap::new(),
        })
    }

    /// The always-monitored main region.
    #[must_use]
    pub fn main_region(&self) -> &RegionDescriptor {
        &self.main
    }

    /// Build the sub-region for one beacon.
    ///
    /// Pure and deterministic: the identifier is derived from (major, minor),
    /// so the same identity always yields the same descriptor and
    /// re-registration with the location service is safe.
    #[must_use]
    pub fn sub_region_for(&self, identity: &BeaconIdentity) -> RegionDescriptor {
        RegionDescriptor {
            identifier: format!("SubRegion-{}-{}", identity.major, identity.minor),
            kind: RegionKind::Sub,
            scope: RegionScope::Beacon {
                uuid: identity.proximity_uuid,
                major: identity.major,
                minor: identity.minor,
            },
            notify_on_entry: true,
            notify_on_exit: true,
            notify_on_display: true,
        }
    }

    /// Record `region` as monitored. Recording an already-present region is
    /// a no-op.
    pub fn record_monitoring_started(&mut self, region: RegionDescriptor) {
        self.monitored.insert(region.identifier.clone(), region);
    }

    /// Remove a region from the mirror. Returns `true` when it was present.
    pub fn record_monitoring_stopped(&mut self, identifier: &str) -> bool {
        self.monitored.remove(identifier).is_some()
    }

    /// Whether the mirror currently holds `identifier`.
    #[must_use]
    pub fn is_monitored(&self, identifier: &str) -> bool {
        self.monitored.contains_key(identifier)
    }

    /// Number of regions the mirror currently holds.
    #[must_use]
    pub fn monitored_count(&self) -> usize {
        self.monitored.len()
    }

    /// Iterate over the mirrored regions, in no particular order.
    pub fn monitored_regions(&self) -> impl Iterator<Item = &RegionDescriptor> {
        self.monitored.values()
    }

    /// Clear the mirror. Part of the startup reset to a known-empty baseline.
    pub fn reset(&mut self) {
        self.monitored.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: &str = "90dc5409-c9f4-4854-bc38-94367885850e";

    fn registry() -> RegionRegistry {
        RegionRegistry::new(FAMILY, "MainRegion").unwrap()
    }

    fn beacon(major: u16, minor: u16) -> BeaconIdentity {
        BeaconIdentity::new(FAMILY.parse().unwrap(), major, minor)
    }

    #[test]
    fn test_main_region_from_valid_uuid() {
        let registry = registry();
        let main = registry.main_region();

        assert_eq!(main.identifier, "MainRegion");
        assert_eq!(main.kind, RegionKind::Main);
        assert_eq!(
            main.scope,
            RegionScope::Family {
                uuid: FAMILY.parse().unwrap()
            }
        );
        assert!(main.notify_on_entry);
        assert!(main.notify_on_exit);
        assert!(main.notify_on_display);
    }

    #[test]
    fn test_invalid_uuid_is_rejected() {
        let err = RegionRegistry::new("not-a-uuid", "MainRegion").unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(err.error_code(), "INVALID_BEACON_UUID");
    }

    #[test]
    fn test_sub_region_identifier_scheme() {
        let registry = registry();
        let sub = registry.sub_region_for(&beacon(3, 17));

        assert_eq!(sub.identifier, "SubRegion-3-17");
        assert_eq!(sub.kind, RegionKind::Sub);
        assert_eq!(
            sub.scope,
            RegionScope::Beacon {
                uuid: FAMILY.parse().unwrap(),
                major: 3,
                minor: 17
            }
        );
        assert!(sub.notify_on_entry && sub.notify_on_exit && sub.notify_on_display);
    }

    #[test]
    fn test_sub_region_is_deterministic() {
        let registry = registry();
        assert_eq!(
            registry.sub_region_for(&beacon(1, 2)),
            registry.sub_region_for(&beacon(1, 2))
        );
    }

    #[test]
    fn test_sub_regions_are_distinct_per_identity() {
        let registry = registry();
        let a = registry.sub_region_for(&beacon(1, 1));
        let b = registry.sub_region_for(&beacon(1, 2));
        let c = registry.sub_region_for(&beacon(2, 1));

        assert_ne!(a.identifier, b.identifier);
        assert_ne!(a.identifier, c.identifier);
        assert_ne!(b.identifier, c.identifier);
    }

    #[test]
    fn test_monitored_mirror_bookkeeping() {
        let mut registry = registry();
        assert_eq!(registry.monitored_count(), 0);

        let main = registry.main_region().clone();
        registry.record_monitoring_started(main.clone());
        assert!(registry.is_monitored("MainRegion"));
        assert_eq!(registry.monitored_count(), 1);

        // Recording the same region twice does not double-count.
        registry.record_monitoring_started(main);
        assert_eq!(registry.monitored_count(), 1);

        let sub = registry.sub_region_for(&beacon(1, 1));
        registry.record_monitoring_started(sub);
        assert_eq!(registry.monitored_count(), 2);

        assert!(registry.record_monitoring_stopped("SubRegion-1-1"));
        assert!(!registry.record_monitoring_stopped("SubRegion-1-1"));
        assert_eq!(registry.monitored_count(), 1);
    }

    #[test]
    fn test_reset_clears_mirror() {
        let mut registry = registry();
        let main = registry.main_region().clone();
        registry.record_monitoring_started(main);
        let sub = registry.sub_region_for(&beacon(9, 9));
        registry.record_monitoring_started(sub);

        registry.reset();
        assert_eq!(registry.monitored_count(), 0);
        assert!(!registry.is_monitored("MainRegion"));
    }
}
