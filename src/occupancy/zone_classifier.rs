//! Zone and quality classification of tracked objects.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::error::{OccupancyError, Result};
use crate::occupancy::motion::MotionEstimator;
use crate::occupancy::rect::Rect;
use crate::occupancy::tracked_object::{TrackId, TrackedObject};

/// Confidence used when an object has no usable score history. Never passes
/// any threshold.
pub const NON_PASSING_CONFIDENCE: f32 = f32::NEG_INFINITY;

/// Position reported when the zone has no horizontal extent.
pub const DEGENERATE_ZONE_POSITION: f32 = 50.0;

/// Zone corners as reported by calibration, in pixel space.
///
/// Only the x of `leftmost`/`rightmost` and the y of `topmost`/`bottommost`
/// are used. A ceiling and floor both at 0 disable the vertical test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBoundaries {
    pub leftmost: Point2<f32>,
    pub rightmost: Point2<f32>,
    pub topmost: Point2<f32>,
    pub bottommost: Point2<f32>,
}

impl Default for ZoneBoundaries {
    fn default() -> Self {
        Self {
            leftmost: Point2::new(20.0, 400.0),
            rightmost: Point2::new(1260.0, 400.0),
            topmost: Point2::new(640.0, 440.0),
            bottommost: Point2::new(640.0, 650.0),
        }
    }
}

impl ZoneBoundaries {
    pub fn new(
        leftmost: Point2<f32>,
        rightmost: Point2<f32>,
        topmost: Point2<f32>,
        bottommost: Point2<f32>,
    ) -> Self {
        Self {
            leftmost,
            rightmost,
            topmost,
            bottommost,
        }
    }

    /// Zone limited horizontally only.
    pub fn horizontal(left: f32, right: f32) -> Self {
        Self::new(
            Point2::new(left, 0.0),
            Point2::new(right, 0.0),
            Point2::origin(),
            Point2::origin(),
        )
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.leftmost.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.rightmost.x
    }

    #[inline]
    pub fn ceiling(&self) -> f32 {
        self.topmost.y
    }

    #[inline]
    pub fn floor(&self) -> f32 {
        self.bottommost.y
    }

    pub fn has_vertical_limits(&self) -> bool {
        self.ceiling() != 0.0 || self.floor() != 0.0
    }

    /// Replace all four corners, e.g. after a new calibration.
    pub fn replace(&mut self, other: ZoneBoundaries) {
        *self = other;
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.left() < self.right()) {
            return Err(OccupancyError::EmptyZone {
                left: self.left(),
                right: self.right(),
            });
        }
        Ok(())
    }

    /// Whether a box lies outside the zone.
    ///
    /// Vertically the feet (bottom edge) must stay above the floor and the
    /// point `foot_offset` above them must stay below the ceiling.
    /// Horizontally the center must lie within `[left, right]`.
    pub fn is_outside(&self, rect: &Rect) -> bool {
        let center = rect.center();
        if self.has_vertical_limits() {
            let bottom = rect.bottom();
            if bottom > self.floor() || bottom - rect.foot_offset() < self.ceiling() {
                return true;
            }
        }
        center.x < self.left() || center.x > self.right()
    }

    /// Horizontal position normalized to 0..100 across the zone width.
    pub fn position(&self, x: f32) -> f32 {
        let width = self.right() - self.left();
        if width <= 0.0 {
            return DEGENERATE_ZONE_POSITION;
        }
        (x - self.left()) / (width / 100.0)
    }
}

/// Quality thresholds an object must pass to be counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum number of tracked frames
    pub min_age: u32,
    /// Minimum median-of-medians detection score
    pub min_score: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_age: 2,
            min_score: 0.05,
        }
    }
}

/// A tracked object counted inside the zone this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifiedDetection {
    pub id: TrackId,
    pub inside: bool,
    pub moving: bool,
    /// Normalized horizontal position, 0..100
    pub position: f32,
}

impl ClassifiedDetection {
    pub fn new(id: TrackId, moving: bool, position: f32) -> Self {
        Self {
            id,
            inside: true,
            moving,
            position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawLabel {
    Tracked(TrackId),
    /// Qualifying object outside the zone
    Outside,
}

/// What a visualizer needs to draw one qualifying object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawInfo {
    pub label: DrawLabel,
    pub rect: Rect,
    pub center: Point2<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Objects inside the zone, in input order
    pub detections: Vec<ClassifiedDetection>,
    /// Every qualifying object, inside or outside
    pub draw_info: Vec<DrawInfo>,
}

/// Filters tracked objects on liveness, age and confidence, then splits them
/// into inside and outside the zone.
#[derive(Debug, Clone, Default)]
pub struct ZoneClassifier {
    config: ClassifierConfig,
}

impl ZoneClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ClassifierConfig) {
        self.config = config;
    }

    /// Classify one frame of tracked objects.
    ///
    /// Only objects inside the zone feed the motion history.
    pub fn classify(
        &self,
        objects: &[TrackedObject],
        motion: &mut MotionEstimator,
        zone: &ZoneBoundaries,
    ) -> Classification {
        let mut classification = Classification::default();

        for object in objects {
            let Some((id, rect)) = self.qualify(object) else {
                continue;
            };
            let center = rect.center();

            if zone.is_outside(&rect) {
                classification.draw_info.push(DrawInfo {
                    label: DrawLabel::Outside,
                    rect,
                    center,
                });
                continue;
            }

            let position = zone.position(center.x);
            let moving = motion.update(id, object.age, center.x);
            classification
                .detections
                .push(ClassifiedDetection::new(id, moving, position));
            classification.draw_info.push(DrawInfo {
                label: DrawLabel::Tracked(id),
                rect,
                center,
            });
        }

        tracing::trace!(
            objects = objects.len(),
            inside = classification.detections.len(),
            drawn = classification.draw_info.len(),
            "classified frame"
        );
        classification
    }

    /// Identity and box of an object that passes liveness, age and
    /// confidence checks. Identity 0 is reserved for empty slots.
    fn qualify(&self, object: &TrackedObject) -> Option<(TrackId, Rect)> {
        if !object.is_live() {
            return None;
        }
        let id = object.id.filter(|&id| id != 0)?;
        let rect = object.rect()?;
        let confidence = object.confidence().unwrap_or(NON_PASSING_CONFIDENCE);
        if object.age < self.config.min_age || confidence < self.config.min_score {
            return None;
        }
        Some((id, rect))
    }
}
