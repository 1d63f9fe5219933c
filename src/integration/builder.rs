//! Builder for creating TrackedObject values from various box formats.

use ndarray::{Array1, array};

use crate::occupancy::{TrackId, TrackedObject};

/// Builder for `TrackedObject`, mainly for tracker adapters and tests.
///
/// Defaults to a tracked, fully live two-point object with no score history.
#[derive(Debug, Clone)]
pub struct TrackedObjectBuilder {
    id: Option<TrackId>,
    age: u32,
    live_points: Vec<bool>,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    past_scores: Vec<Array1<f32>>,
}

impl Default for TrackedObjectBuilder {
    fn default() -> Self {
        Self {
            id: None,
            age: 0,
            live_points: vec![true, true],
            x1: 0.0,
            y1: 0.0,
            x2: 0.0,
            y2: 0.0,
            past_scores: Vec::new(),
        }
    }
}

impl TrackedObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: TrackId) -> Self {
        self.id = Some(id);
        self
    }

    /// Object the tracker has not assigned an identity to.
    pub fn no_id(mut self) -> Self {
        self.id = None;
        self
    }

    pub fn age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn live_points(mut self, live_points: &[bool]) -> Self {
        self.live_points = live_points.to_vec();
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// One past detection per score, scored identically on both points.
    pub fn scores(mut self, scores: &[f32]) -> Self {
        self.past_scores = scores.iter().map(|&s| array![s, s]).collect();
        self
    }

    /// Append one past detection with per-point scores.
    pub fn past_detection(mut self, scores: &[f32]) -> Self {
        self.past_scores.push(Array1::from_vec(scores.to_vec()));
        self
    }

    pub fn no_scores(mut self) -> Self {
        self.past_scores.clear();
        self
    }

    pub fn build(self) -> TrackedObject {
        TrackedObject {
            id: self.id,
            age: self.age,
            live_points: self.live_points,
            estimate: array![[self.x1, self.y1], [self.x2, self.y2]],
            past_scores: self.past_scores,
        }
    }
}
