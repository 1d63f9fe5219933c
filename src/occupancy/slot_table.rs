//! Fixed-capacity occupancy table with an occlusion cache.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{OccupancyError, Result};
use crate::integration::SlotSink;
use crate::occupancy::crossing_cache::{CrossingCache, CrossingEntry};
use crate::occupancy::slot::{Occupant, Slot, SlotMessage};
use crate::occupancy::tracked_object::TrackId;
use crate::occupancy::zone_classifier::ClassifiedDetection;

/// Configuration for the OccupancySlotTable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotTableConfig {
    /// Number of slots, fixed for the table's lifetime
    pub capacity: usize,
    /// Frames a departed occupant keeps its slot before it is cleared; 0
    /// clears it on the next frame
    pub countdown_frames: u32,
    /// Disappearing within this many percent of either edge is a departure
    pub leaving_offset_pct: f32,
    /// Seconds an occluded occupant stays cached; values beyond what a
    /// `Duration` holds never expire
    pub ttl_seconds: f64,
    /// Largest position difference, in percent, to re-identify a cached occupant
    pub reappear_offset_pct: f32,
}

impl Default for SlotTableConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            countdown_frames: 36,
            leaving_offset_pct: 1.0,
            ttl_seconds: 3.0,
            reappear_offset_pct: 5.0,
        }
    }
}

impl SlotTableConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(OccupancyError::ZeroCapacity);
        }
        check_non_negative("leaving_offset_pct", f64::from(self.leaving_offset_pct))?;
        check_non_negative("ttl_seconds", self.ttl_seconds)?;
        check_non_negative("reappear_offset_pct", f64::from(self.reappear_offset_pct))?;
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::try_from_secs_f64(self.ttl_seconds).unwrap_or(Duration::MAX)
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(OccupancyError::InvalidParameter { name, value })
    }
}

/// Occupancy table reconciling each frame's detections against its slots.
///
/// Occupants that vanish deep inside the zone are assumed occluded: their
/// slot is frozen in a crossing cache until the tracker finds them again, a
/// new identity shows up close to their last position, or the TTL runs out.
/// Occupants that vanish near an edge left the zone and their slot counts
/// down to empty.
#[derive(Debug, Clone)]
pub struct OccupancySlotTable {
    slots: Vec<Slot>,
    cache: CrossingCache,
    config: SlotTableConfig,
}

impl OccupancySlotTable {
    pub fn new(config: SlotTableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            slots: vec![Slot::EMPTY; config.capacity],
            cache: CrossingCache::default(),
            config,
        })
    }

    pub fn config(&self) -> &SlotTableConfig {
        &self.config
    }

    /// Change parameters between frames. Capacity cannot change.
    pub fn set_config(&mut self, config: SlotTableConfig) -> Result<()> {
        config.validate()?;
        if config.capacity != self.slots.len() {
            return Err(OccupancyError::CapacityChanged {
                current: self.slots.len(),
                requested: config.capacity,
            });
        }
        self.config = config;
        Ok(())
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn cached(&self) -> &[CrossingEntry] {
        self.cache.entries()
    }

    /// Index of the slot held by `id`.
    pub fn slot_of(&self, id: TrackId) -> Option<usize> {
        self.slots.iter().position(|s| s.present_id() == Some(id))
    }

    /// Reconcile one frame and publish every slot to `sink`.
    ///
    /// The table is fully updated before the first message is sent. Returns
    /// whether a new person was given a slot.
    pub fn update<S: SlotSink>(
        &mut self,
        detections: Vec<ClassifiedDetection>,
        sink: &mut S,
    ) -> std::result::Result<bool, S::Error> {
        self.update_at(detections, Instant::now(), sink)
    }

    /// `update` with an explicit instant for cache timestamps and expiry.
    pub fn update_at<S: SlotSink>(
        &mut self,
        detections: Vec<ClassifiedDetection>,
        now: Instant,
        sink: &mut S,
    ) -> std::result::Result<bool, S::Error> {
        let new_person = self.reconcile_at(detections, now);
        self.publish(sink)?;
        Ok(new_person)
    }

    pub fn reconcile(&mut self, detections: Vec<ClassifiedDetection>) -> bool {
        self.reconcile_at(detections, Instant::now())
    }

    /// Reconcile one frame using `now` for cache timestamps and expiry.
    ///
    /// Detections carrying identity 0 are ignored; 0 marks an empty slot.
    pub fn reconcile_at(&mut self, mut detections: Vec<ClassifiedDetection>, now: Instant) -> bool {
        detections.retain(|d| {
            if d.id == 0 {
                tracing::debug!(position = d.position, "ignoring detection with identity 0");
            }
            d.id != 0
        });
        let seen: HashSet<TrackId> = detections.iter().map(|d| d.id).collect();

        self.scan_departures(&seen, now);

        for entry in self.cache.take_reacquired(&seen) {
            tracing::debug!(id = entry.id(), slot = entry.slot, "occupant reacquired by tracker");
        }

        for entry in self.cache.take_expired(now, self.config.ttl()) {
            tracing::debug!(id = entry.id(), slot = entry.slot, "cached occupant expired");
            if let Some(index) = self.slot_of(entry.id()) {
                self.slots[index].begin_leaving();
            }
            detections.retain(|d| d.id != entry.id());
        }

        let new_person = self.assign(detections);

        // Cached occupants keep their last known state through the gap.
        for entry in self.cache.entries() {
            if let Some(index) = self.slot_of(entry.id()) {
                self.slots[index] = Slot::from_detection(&entry.snapshot);
            }
        }

        tracing::trace!(slots = ?self.slots, cached = self.cache.len(), "occupancy table");
        new_person
    }

    /// Departures and countdown, computed from the slots as they were at the
    /// start of the frame. A slot entering its countdown this frame is not
    /// aged until the next one.
    fn scan_departures(&mut self, seen: &HashSet<TrackId>, now: Instant) {
        let mut next = self.slots.clone();

        for (index, slot) in self.slots.iter().enumerate() {
            match slot.occupant {
                Occupant::Present(id) if !seen.contains(&id) => {
                    if self.is_deep_inside(slot.position) {
                        if !self.cache.contains_slot(index) {
                            next[index].moving = true;
                            if let Some(snapshot) = next[index].as_detection() {
                                tracing::debug!(id, slot = index, position = slot.position, "occupant occluded, caching");
                                self.cache.insert(CrossingEntry {
                                    slot: index,
                                    snapshot,
                                    since: now,
                                });
                            }
                        }
                    } else {
                        tracing::debug!(id, slot = index, position = slot.position, "occupant left the zone");
                        next[index].begin_leaving();
                    }
                }
                Occupant::Leaving(frames) => {
                    if frames < self.config.countdown_frames {
                        next[index].occupant = Occupant::Leaving(frames + 1);
                    } else {
                        tracing::debug!(slot = index, "countdown finished, slot cleared");
                        next[index] = Slot::EMPTY;
                    }
                }
                _ => {}
            }
        }

        self.slots = next;
    }

    fn is_deep_inside(&self, position: f32) -> bool {
        let offset = self.config.leaving_offset_pct;
        position > offset && position < 100.0 - offset
    }

    /// Update held slots, re-identify cached occupants, and allocate at most
    /// one new slot.
    fn assign(&mut self, detections: Vec<ClassifiedDetection>) -> bool {
        let mut new_person = false;

        for detection in detections {
            if let Some(index) = self.slot_of(detection.id) {
                self.slots[index] = Slot::from_detection(&detection);
                continue;
            }

            if let Some(entry) = self
                .cache
                .take_reappearance(detection.position, self.config.reappear_offset_pct)
            {
                tracing::debug!(
                    old_id = entry.id(),
                    new_id = detection.id,
                    slot = entry.slot,
                    "cached occupant reappeared under a new identity"
                );
                self.slots[entry.slot] = Slot::from_detection(&detection);
                continue;
            }

            if new_person {
                tracing::debug!(id = detection.id, "slot already allocated this frame, dropping");
                continue;
            }

            match self.slots.iter().position(Slot::is_empty) {
                Some(index) => {
                    tracing::debug!(id = detection.id, slot = index, "new occupant");
                    self.slots[index] = Slot::from_detection(&detection);
                    new_person = true;
                }
                None => {
                    tracing::warn!(id = detection.id, "no empty slot, dropping detection");
                }
            }
        }

        new_person
    }

    /// Messages for every slot, in slot order.
    pub fn messages(&self) -> impl Iterator<Item = SlotMessage> + '_ {
        self.slots
            .iter()
            .enumerate()
            .flat_map(|(index, slot)| slot.messages(index))
    }

    pub fn publish<S: SlotSink>(&self, sink: &mut S) -> std::result::Result<(), S::Error> {
        for message in self.messages() {
            sink.send(message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::RecordingSink;
    use crate::occupancy::slot::{SlotField, SlotValue};

    fn config() -> SlotTableConfig {
        SlotTableConfig {
            capacity: 3,
            countdown_frames: 2,
            leaving_offset_pct: 5.0,
            ttl_seconds: 3.0,
            reappear_offset_pct: 5.0,
        }
    }

    fn det(id: TrackId, position: f32) -> ClassifiedDetection {
        ClassifiedDetection::new(id, true, position)
    }

    fn assert_invariants(table: &OccupancySlotTable) {
        let mut ids = HashSet::new();
        for slot in table.slots() {
            if slot.is_empty() {
                assert!(!slot.inside);
                assert!(slot.moving);
                assert_eq!(slot.position, 0.0);
            }
            if let Some(id) = slot.present_id() {
                assert!(ids.insert(id), "identity {id} held twice");
            }
        }
    }

    #[test]
    fn test_new_person_allocates_first_empty_slot() {
        let mut table = OccupancySlotTable::new(config()).unwrap();
        assert!(table.reconcile(vec![det(7, 50.0)]));
        assert_eq!(table.slots()[0].identity(), 7);
        assert!(!table.reconcile(vec![det(7, 52.0)]));
        assert_eq!(table.slots()[0].position, 52.0);
        assert_invariants(&table);
    }

    #[test]
    fn test_only_one_allocation_per_frame() {
        let mut table = OccupancySlotTable::new(config()).unwrap();
        assert!(table.reconcile(vec![det(1, 20.0), det(2, 60.0)]));
        assert_eq!(table.slot_of(1), Some(0));
        assert_eq!(table.slot_of(2), None);

        assert!(table.reconcile(vec![det(1, 20.0), det(2, 60.0)]));
        assert_eq!(table.slot_of(2), Some(1));
        assert_invariants(&table);
    }

    #[test]
    fn test_overflow_drops_silently() {
        let mut config = config();
        config.capacity = 1;
        let mut table = OccupancySlotTable::new(config).unwrap();
        assert!(table.reconcile(vec![det(1, 20.0)]));
        assert!(!table.reconcile(vec![det(1, 20.0), det(2, 80.0)]));
        assert_eq!(table.slot_of(2), None);
    }

    #[test]
    fn test_disappearing_mid_zone_is_cached() {
        let start = Instant::now();
        let mut table = OccupancySlotTable::new(config()).unwrap();
        table.reconcile_at(vec![ClassifiedDetection::new(7, false, 50.0)], start);
        table.reconcile_at(vec![], start + Duration::from_millis(40));

        assert_eq!(table.cached().len(), 1);
        let slot = table.slots()[0];
        assert_eq!(slot.identity(), 7);
        assert!(slot.inside);
        assert!(slot.moving);
        assert_eq!(slot.position, 50.0);

        // stays cached once, not re-added
        table.reconcile_at(vec![], start + Duration::from_millis(80));
        assert_eq!(table.cached().len(), 1);
    }

    #[test]
    fn test_disappearing_near_edge_counts_down() {
        let mut table = OccupancySlotTable::new(config()).unwrap();
        table.reconcile(vec![det(7, 97.0)]);

        table.reconcile(vec![]);
        assert_eq!(table.slots()[0].identity(), -1);
        assert!(!table.slots()[0].inside);
        assert!(table.cached().is_empty());

        table.reconcile(vec![]);
        assert_eq!(table.slots()[0].identity(), -2);

        table.reconcile(vec![]);
        assert!(table.slots()[0].is_empty());
        assert_invariants(&table);
    }

    #[test]
    fn test_tracker_reacquires_cached_identity() {
        let start = Instant::now();
        let mut table = OccupancySlotTable::new(config()).unwrap();
        table.reconcile_at(vec![det(7, 50.0)], start);
        table.reconcile_at(vec![], start + Duration::from_millis(40));
        let new_person = table.reconcile_at(
            vec![ClassifiedDetection::new(7, false, 70.0)],
            start + Duration::from_millis(80),
        );

        assert!(!new_person);
        assert!(table.cached().is_empty());
        assert_eq!(table.slots()[0].position, 70.0);
        assert!(!table.slots()[0].moving);
    }

    #[test]
    fn test_reappearance_under_new_identity() {
        let start = Instant::now();
        let mut table = OccupancySlotTable::new(config()).unwrap();
        table.reconcile_at(vec![det(7, 50.0)], start);
        table.reconcile_at(vec![], start + Duration::from_millis(40));
        let new_person = table.reconcile_at(vec![det(9, 52.0)], start + Duration::from_millis(80));

        assert!(!new_person);
        assert!(table.cached().is_empty());
        assert_eq!(table.slot_of(9), Some(0));
        assert_eq!(table.slot_of(7), None);
        assert!(table.slots()[1].is_empty());
        assert_invariants(&table);
    }

    #[test]
    fn test_far_new_identity_gets_new_slot() {
        let start = Instant::now();
        let mut table = OccupancySlotTable::new(config()).unwrap();
        table.reconcile_at(vec![det(7, 50.0)], start);
        table.reconcile_at(vec![], start + Duration::from_millis(40));
        let new_person = table.reconcile_at(vec![det(9, 80.0)], start + Duration::from_millis(80));

        assert!(new_person);
        assert_eq!(table.slot_of(9), Some(1));
        assert_eq!(table.slot_of(7), Some(0));
        assert_eq!(table.cached().len(), 1);
    }

    #[test]
    fn test_expired_cache_entry_departs_once() {
        let start = Instant::now();
        let mut table = OccupancySlotTable::new(config()).unwrap();
        table.reconcile_at(vec![det(7, 50.0)], start);
        table.reconcile_at(vec![], start + Duration::from_secs(1));
        table.reconcile_at(vec![], start + Duration::from_secs(2));
        assert_eq!(table.cached().len(), 1);

        table.reconcile_at(vec![], start + Duration::from_secs(4));
        assert!(table.cached().is_empty());
        assert_eq!(table.slots()[0].identity(), -1);

        table.reconcile_at(vec![], start + Duration::from_secs(5));
        assert_eq!(table.slots()[0].identity(), -2);
        assert!(table.cached().is_empty());

        table.reconcile_at(vec![], start + Duration::from_secs(6));
        assert!(table.slots()[0].is_empty());
        assert_invariants(&table);
    }

    #[test]
    fn test_identity_zero_never_occupies_a_slot() {
        let mut table = OccupancySlotTable::new(config()).unwrap();
        let new_person = table.reconcile(vec![ClassifiedDetection::new(0, false, 40.0)]);

        assert!(!new_person);
        assert!(table.slots().iter().all(Slot::is_empty));
        assert_invariants(&table);
    }

    #[test]
    fn test_zero_countdown_clears_on_next_frame() {
        let mut config = config();
        config.countdown_frames = 0;
        let mut table = OccupancySlotTable::new(config).unwrap();
        table.reconcile(vec![det(7, 99.0)]);

        table.reconcile(vec![]);
        assert_eq!(table.slots()[0].identity(), -1);
        table.reconcile(vec![]);
        assert!(table.slots()[0].is_empty());
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let mut config = config();
        config.ttl_seconds = 1e20;
        let start = Instant::now();
        let mut table = OccupancySlotTable::new(config).unwrap();
        assert_eq!(table.config().ttl(), Duration::MAX);

        table.reconcile_at(vec![det(7, 50.0)], start);
        table.reconcile_at(vec![], start + Duration::from_secs(1));
        table.reconcile_at(vec![], start + Duration::from_secs(3600));
        assert_eq!(table.cached().len(), 1);
        assert_eq!(table.slot_of(7), Some(0));
    }

    #[test]
    fn test_update_at_publishes_after_expiry() {
        let start = Instant::now();
        let mut table = OccupancySlotTable::new(config()).unwrap();
        let mut sink = RecordingSink::default();
        table.update_at(vec![det(7, 50.0)], start, &mut sink).unwrap();
        table.update_at(vec![], start + Duration::from_secs(1), &mut sink).unwrap();
        sink.clear();

        let new_person = table
            .update_at(vec![], start + Duration::from_secs(4), &mut sink)
            .unwrap();

        assert!(!new_person);
        assert_eq!(sink.latest(0, SlotField::Inside), Some(SlotValue::Int(0)));
        assert_eq!(sink.latest(0, SlotField::Moving), Some(SlotValue::Bool(true)));
    }

    #[test]
    fn test_update_publishes_every_slot() {
        let mut table = OccupancySlotTable::new(config()).unwrap();
        let mut sink = RecordingSink::default();
        assert!(table.update(vec![det(7, 50.0)], &mut sink).unwrap());

        let messages = sink.messages();
        assert_eq!(messages.len(), 9);
        assert_eq!(messages[0].address(), "/detect/0/in");
        assert_eq!(messages[8].address(), "/detect/2/pos");
    }

    #[test]
    fn test_config_validation() {
        let mut bad = config();
        bad.capacity = 0;
        assert!(matches!(
            OccupancySlotTable::new(bad),
            Err(OccupancyError::ZeroCapacity)
        ));

        let mut bad = config();
        bad.ttl_seconds = -1.0;
        assert!(OccupancySlotTable::new(bad).is_err());

        let mut table = OccupancySlotTable::new(config()).unwrap();
        let mut bigger = config();
        bigger.capacity = 4;
        assert!(matches!(
            table.set_config(bigger),
            Err(OccupancyError::CapacityChanged { .. })
        ));
        let mut shorter = config();
        shorter.countdown_frames = 5;
        assert!(table.set_config(shorter).is_ok());
        assert_eq!(table.config().countdown_frames, 5);
    }
}
