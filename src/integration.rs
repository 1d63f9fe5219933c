//! Integration module connecting the occupancy engine with its external
//! collaborators.
//!
//! The tracker hands over `TrackedObject`s (see `TrackedObjectBuilder`), slot
//! updates leave through a `SlotSink`, and `OccupancyPipeline` runs a whole
//! frame end to end.

mod builder;
mod pipeline;
mod recalibration;
mod sink;

pub use builder::TrackedObjectBuilder;
pub use pipeline::{FrameReport, OccupancyPipeline};
pub use recalibration::RecalibrationScheduler;
pub use sink::{RecordingSink, SlotSink, TracingSink};
