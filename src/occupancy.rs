mod crossing_cache;
mod motion;
mod rect;
mod slot;
mod slot_table;
mod tracked_object;
mod zone_classifier;

pub use crossing_cache::CrossingEntry;
pub use motion::{INSUFFICIENT_HISTORY_MOVING, MotionEstimator, MotionSample};
pub use rect::Rect;
pub use slot::{Occupant, Slot, SlotField, SlotMessage, SlotValue};
pub use slot_table::{OccupancySlotTable, SlotTableConfig};
pub use tracked_object::{TrackId, TrackedObject};
pub use zone_classifier::{
    ClassifiedDetection, Classification, ClassifierConfig, DEGENERATE_ZONE_POSITION, DrawInfo,
    DrawLabel, NON_PASSING_CONFIDENCE, ZoneBoundaries, ZoneClassifier,
};
