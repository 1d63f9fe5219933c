//! Moving/stationary heuristic over a short horizontal position history.

use std::collections::HashMap;

use crate::occupancy::tracked_object::TrackId;

/// Result reported when fewer than two samples fall inside the window.
/// Without history an object is assumed to be moving.
pub const INSUFFICIENT_HISTORY_MOVING: bool = true;

/// One recorded horizontal position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub age: u32,
    pub x: f32,
}

/// Keeps the last `window` frames of x positions per identity.
#[derive(Debug, Clone)]
pub struct MotionEstimator {
    history: HashMap<TrackId, Vec<MotionSample>>,
    window: u32,
    distance_threshold: f32,
}

impl MotionEstimator {
    /// `window` is the number of frames to look back, `distance_threshold`
    /// the mean per-frame displacement in pixels above which an object moves.
    pub fn new(window: u32, distance_threshold: f32) -> Self {
        Self {
            history: HashMap::new(),
            window,
            distance_threshold,
        }
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    /// Samples currently kept for `id`, in insertion order.
    pub fn history(&self, id: TrackId) -> &[MotionSample] {
        self.history.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of identities with recorded history.
    pub fn tracked_identities(&self) -> usize {
        self.history.len()
    }

    /// Drop all history for `id`.
    pub fn forget(&mut self, id: TrackId) {
        self.history.remove(&id);
    }

    /// Keep history only for identities `keep` returns true for.
    pub fn retain_identities(&mut self, mut keep: impl FnMut(TrackId) -> bool) {
        self.history.retain(|&id, _| keep(id));
    }

    /// Record the position of `id` at `age` and decide whether it moves.
    ///
    /// A mean equal to the threshold counts as stationary.
    pub fn update(&mut self, id: TrackId, age: u32, x: f32) -> bool {
        let samples = self.history.entry(id).or_default();
        samples.push(MotionSample { age, x });

        let oldest = i64::from(age) - i64::from(self.window);
        let mut recent: Vec<MotionSample> = samples
            .iter()
            .filter(|s| i64::from(s.age) >= oldest)
            .copied()
            .collect();
        recent.sort_by_key(|s| s.age);

        let moving = match mean_step(&recent) {
            Some(mean) => mean > self.distance_threshold,
            None => INSUFFICIENT_HISTORY_MOVING,
        };

        samples.retain(|s| i64::from(s.age) >= oldest);
        moving
    }
}

/// Mean absolute difference between consecutive samples.
fn mean_step(samples: &[MotionSample]) -> Option<f32> {
    if samples.len() < 2 {
        return None;
    }
    let total: f32 = samples.windows(2).map(|w| (w[1].x - w[0].x).abs()).sum();
    Some(total / (samples.len() - 1) as f32)
}
