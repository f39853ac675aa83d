//! Beacon identity values and session-scoped discovery tracking.
//!
//! A beacon advertises a (UUID, major, minor) tuple. Two sightings with the
//! same tuple are the same beacon, regardless of which detection produced
//! them, so equality and hashing are structural over the three fields.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a single beacon within a family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeaconIdentity {
    /// Family UUID shared by every beacon in a deployment.
    pub proximity_uuid: Uuid,

    /// Group number within the family.
    pub major: u16,

    /// Individual number within the group.
    pub minor: u16,
}

impl BeaconIdentity {
    /// Create a new identity.
    #[must_use]
    pub const fn new(proximity_uuid: Uuid, major: u16, minor: u16) -> Self {
        Self {
            proximity_uuid,
            major,
            minor,
        }
    }
}

impl fmt::Display for BeaconIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.proximity_uuid, self.major, self.minor)
    }
}

/// Session-scoped record of every beacon seen so far.
///
/// The set grows monotonically: identities are never evicted, and an identity
/// is recorded at most once per session. Each entry keeps the instant it was
/// first seen; the timestamp is metadata and plays no part in deduplication.
#[derive(Debug, Default)]
pub struct DiscoverySet {
    seen: HashMap<BeaconIdentity, DateTime<Utc>>,
}

impl DiscoverySet {
    /// Create an empty discovery set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `identity` has been discovered this session.
    #[must_use]
    pub fn contains(&self, identity: &BeaconIdentity) -> bool {
        self.seen.contains_key(identity)
    }

    /// Record a discovery.
    ///
    /// Returns `true` when `identity` was not seen before. Check and insert
    /// happen as one step, so a caller acting on `true` can never act twice
    /// for the same identity.
    pub fn insert(&mut self, identity: BeaconIdentity) -> bool {
        match self.seen.entry(identity) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                true
            }
        }
    }

    /// When `identity` was first seen, if it has been.
    #[must_use]
    pub fn first_seen(&self, identity: &BeaconIdentity) -> Option<DateTime<Utc>> {
        self.seen.get(identity).copied()
    }

    /// Number of distinct beacons discovered this session.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no beacons have been discovered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Iterate over every discovered identity, in no particular order.
    pub fn identities(&self) -> impl Iterator<Item = &BeaconIdentity> {
        self.seen.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: &str = "90dc5409-c9f4-4854-bc38-94367885850e";

    fn beacon(major: u16, minor: u16) -> BeaconIdentity {
        BeaconIdentity::new(FAMILY.parse().unwrap(), major, minor)
    }

    #[test]
    fn test_identity_equality_is_structural() {
        assert_eq!(beacon(1, 1), beacon(1, 1));
        assert_ne!(beacon(1, 1), beacon(1, 2));
        assert_ne!(beacon(1, 1), beacon(2, 1));

        let other_family = BeaconIdentity::new(Uuid::new_v4(), 1, 1);
        assert_ne!(beacon(1, 1), other_family);
    }

    #[test]
    fn test_identity_serialization() {
        let json = serde_json::to_string(&beacon(3, 9)).unwrap();
        let back: BeaconIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, beacon(3, 9));
    }

    #[test]
    fn test_insert_returns_true_exactly_once() {
        let mut set = DiscoverySet::new();

        assert!(set.insert(beacon(1, 1)));
        assert!(!set.insert(beacon(1, 1)));
        assert!(!set.insert(beacon(1, 1)));

        assert!(set.insert(beacon(1, 2)));
        assert!(!set.insert(beacon(1, 2)));

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_contains_and_first_seen() {
        let mut set = DiscoverySet::new();
        assert!(!set.contains(&beacon(7, 7)));
        assert!(set.first_seen(&beacon(7, 7)).is_none());

        set.insert(beacon(7, 7));
        assert!(set.contains(&beacon(7, 7)));
        assert!(set.first_seen(&beacon(7, 7)).is_some());
    }

    #[test]
    fn test_first_seen_is_stable_across_reinsert() {
        let mut set = DiscoverySet::new();
        set.insert(beacon(1, 1));
        let first = set.first_seen(&beacon(1, 1)).unwrap();

        set.insert(beacon(1, 1));
        assert_eq!(set.first_seen(&beacon(1, 1)).unwrap(), first);
    }

    #[test]
    fn test_empty_set() {
        let set = DiscoverySet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert_eq!(set.identities().count(), 0);
    }
}
