//! Occupancy tracking for people inside a calibrated zone.
//!
//! Tracked objects from an external multi-object tracker are classified
//! against the zone, given a moving/stationary flag and a normalized
//! position, then reconciled into a fixed-size table of occupant slots that
//! bridges short identity losses caused by occlusion.

pub mod config;
pub mod error;
pub mod integration;
pub mod occupancy;

pub use config::{EngineConfig, MotionConfig, RecalibrationConfig};
pub use error::OccupancyError;
pub use integration::{
    FrameReport, OccupancyPipeline, RecalibrationScheduler, RecordingSink, SlotSink,
    TracingSink, TrackedObjectBuilder,
};
pub use occupancy::{
    ClassifiedDetection, Classification, ClassifierConfig, DrawInfo, DrawLabel,
    MotionEstimator, Occupant, OccupancySlotTable, Rect, Slot, SlotField, SlotMessage, SlotTableConfig,
    SlotValue, TrackId, TrackedObject, ZoneBoundaries, ZoneClassifier,
};
