//! Cache of occupants that vanished in the middle of the zone.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::occupancy::tracked_object::TrackId;
use crate::occupancy::zone_classifier::ClassifiedDetection;

/// Last known state of an occluded occupant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossingEntry {
    /// Slot the occupant still holds
    pub slot: usize,
    /// Slot state at disappearance, moving forced to true
    pub snapshot: ClassifiedDetection,
    /// When the occupant disappeared
    pub since: Instant,
}

impl CrossingEntry {
    pub fn id(&self) -> TrackId {
        self.snapshot.id
    }
}

/// Entries in insertion order. Every operation rebuilds the entry list
/// instead of removing while iterating.
#[derive(Debug, Clone, Default)]
pub(crate) struct CrossingCache {
    entries: Vec<CrossingEntry>,
}

impl CrossingCache {
    pub fn entries(&self) -> &[CrossingEntry] {
        &self.entries
    }

    pub fn contains_slot(&self, slot: usize) -> bool {
        self.entries.iter().any(|e| e.slot == slot)
    }

    pub fn insert(&mut self, entry: CrossingEntry) {
        self.entries.push(entry);
    }

    /// Drop entries whose identity the tracker reports again; returns them.
    pub fn take_reacquired(&mut self, seen: &HashSet<TrackId>) -> Vec<CrossingEntry> {
        let (reacquired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| seen.contains(&e.id()));
        self.entries = kept;
        reacquired
    }

    /// Drop entries at least `ttl` old at `now`; returns them.
    pub fn take_expired(&mut self, now: Instant, ttl: Duration) -> Vec<CrossingEntry> {
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| now.saturating_duration_since(e.since) >= ttl);
        self.entries = kept;
        expired
    }

    /// Remove and return the first entry, in insertion order, whose position
    /// is within `offset` of `position`.
    pub fn take_reappearance(&mut self, position: f32, offset: f32) -> Option<CrossingEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| (e.snapshot.position - position).abs() <= offset)?;
        Some(self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
