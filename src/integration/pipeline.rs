//! OccupancyPipeline running classification, reconciliation and publishing
//! for one frame.

use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::occupancy::{
    ClassifiedDetection, DrawInfo, MotionEstimator, OccupancySlotTable, TrackedObject,
    ZoneBoundaries, ZoneClassifier,
};

use super::{RecalibrationScheduler, SlotSink};

/// What happened during one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// A person was given a previously empty slot
    pub new_person: bool,
    /// The external calibration routine should run now
    pub recalibrate: bool,
    /// Objects counted inside the zone
    pub detections: Vec<ClassifiedDetection>,
    /// Every qualifying object, for a visualizer
    pub draw_info: Vec<DrawInfo>,
}

/// Owns every piece of engine state and the outbound sink.
///
/// Frames must be fed in arrival order; each call is applied completely
/// before its messages are sent.
pub struct OccupancyPipeline<S: SlotSink> {
    classifier: ZoneClassifier,
    motion: MotionEstimator,
    table: OccupancySlotTable,
    zone: ZoneBoundaries,
    recalibration: RecalibrationScheduler,
    sink: S,
}

impl<S: SlotSink> OccupancyPipeline<S> {
    /// Create a pipeline from a validated configuration.
    pub fn new(config: &EngineConfig, sink: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: ZoneClassifier::new(config.classifier),
            motion: MotionEstimator::new(config.motion.window, config.motion.distance_threshold),
            table: OccupancySlotTable::new(config.slots)?,
            zone: config.zone,
            recalibration: RecalibrationScheduler::from_config(&config.recalibration),
            sink,
        })
    }

    /// Create a new pipeline with default configuration.
    pub fn with_default_config(sink: S) -> Result<Self> {
        Self::new(&EngineConfig::default(), sink)
    }

    /// Process one frame of tracked objects.
    ///
    /// Motion history is dropped for identities that are neither reported by
    /// the tracker this frame nor holding a slot.
    pub fn process_frame(
        &mut self,
        objects: &[TrackedObject],
    ) -> std::result::Result<FrameReport, S::Error> {
        let classification = self
            .classifier
            .classify(objects, &mut self.motion, &self.zone);
        let new_person = self
            .table
            .update(classification.detections.clone(), &mut self.sink)?;
        let recalibrate = self.recalibration.on_frame(new_person);

        let reported: HashSet<_> = objects.iter().filter_map(|o| o.id).collect();
        let table = &self.table;
        self.motion
            .retain_identities(|id| reported.contains(&id) || table.slot_of(id).is_some());

        Ok(FrameReport {
            new_person,
            recalibrate,
            detections: classification.detections,
            draw_info: classification.draw_info,
        })
    }

    /// Swap in boundaries from a fresh calibration. Takes effect next frame.
    pub fn set_zone(&mut self, zone: ZoneBoundaries) -> Result<()> {
        zone.validate()?;
        self.zone.replace(zone);
        Ok(())
    }

    pub fn zone(&self) -> &ZoneBoundaries {
        &self.zone
    }

    pub fn table(&self) -> &OccupancySlotTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut OccupancySlotTable {
        &mut self.table
    }

    pub fn motion(&self) -> &MotionEstimator {
        &self.motion
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integration::{RecordingSink, TrackedObjectBuilder};
    use crate::occupancy::{SlotField, SlotValue};

    #[test]
    fn test_occupancy_pipeline() {
        let mut config = EngineConfig::default();
        config.zone = ZoneBoundaries::horizontal(0.0, 1000.0);
        config.slots.capacity = 2;
        let mut pipeline = OccupancyPipeline::new(&config, RecordingSink::default()).unwrap();

        let person = TrackedObjectBuilder::new()
            .id(1)
            .age(4)
            .xywh(250.0, 300.0, 40.0, 120.0)
            .scores(&[0.8])
            .build();
        let report = pipeline.process_frame(&[person]).unwrap();

        assert!(report.new_person);
        assert!(!report.recalibrate);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(pipeline.table().slot_of(1), Some(0));
        assert_eq!(pipeline.sink().messages().len(), 6);
        assert_eq!(
            pipeline.sink().latest(0, SlotField::Position),
            Some(SlotValue::Float(25.0))
        );
    }

    #[test]
    fn test_departed_identities_release_motion_history() {
        let mut config = EngineConfig::default();
        config.zone = ZoneBoundaries::horizontal(0.0, 1000.0);
        config.slots.countdown_frames = 1;
        let mut pipeline = OccupancyPipeline::new(&config, RecordingSink::default()).unwrap();

        let person = |id, age| {
            TrackedObjectBuilder::new()
                .id(id)
                .age(age)
                .xywh(5.0, 300.0, 10.0, 120.0)
                .scores(&[0.8])
                .build()
        };

        for (id, first_age) in [(1, 2), (2, 2), (3, 2)] {
            pipeline.process_frame(&[person(id, first_age)]).unwrap();
            pipeline.process_frame(&[person(id, first_age + 1)]).unwrap();
        }
        // 1 and 2 left near the edge and counted down; only 3 remains
        assert_eq!(pipeline.motion().tracked_identities(), 1);
        assert_eq!(pipeline.motion().history(3).len(), 2);

        // an occluded occupant keeps its history while it holds a slot
        let mut config = EngineConfig::default();
        config.zone = ZoneBoundaries::horizontal(0.0, 1000.0);
        let mut pipeline = OccupancyPipeline::new(&config, RecordingSink::default()).unwrap();
        let centered = TrackedObjectBuilder::new()
            .id(8)
            .age(2)
            .xywh(500.0, 300.0, 40.0, 120.0)
            .scores(&[0.8])
            .build();
        pipeline.process_frame(&[centered]).unwrap();
        pipeline.process_frame(&[]).unwrap();
        assert_eq!(pipeline.table().cached().len(), 1);
        assert_eq!(pipeline.motion().history(8).len(), 1);
    }

    #[test]
    fn test_set_zone_rejects_empty_zone() {
        let mut pipeline = OccupancyPipeline::with_default_config(RecordingSink::default()).unwrap();
        assert!(pipeline.set_zone(ZoneBoundaries::horizontal(10.0, 5.0)).is_err());
        assert_eq!(pipeline.zone().left(), 20.0);
        assert!(pipeline.set_zone(ZoneBoundaries::horizontal(0.0, 640.0)).is_ok());
        assert_eq!(pipeline.zone().right(), 640.0);
    }
}
