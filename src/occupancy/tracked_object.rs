//! Tracked object as handed over by the external multi-object tracker.

use ndarray::{Array1, Array2};

use crate::occupancy::rect::Rect;

/// Identity assigned by the tracker. Always positive.
pub type TrackId = u64;

/// One tracked object for the current frame.
#[derive(Debug, Clone)]
pub struct TrackedObject {
    /// Tracker identity; `None` means the tracker has not assigned one yet
    pub id: Option<TrackId>,
    /// Number of frames the object has been tracked
    pub age: u32,
    /// Liveness flag for every tracked point
    pub live_points: Vec<bool>,
    /// Two-point estimate, rows are top-left and bottom-right (`2x2`)
    pub estimate: Array2<f32>,
    /// Scores of every past detection matched to this object
    pub past_scores: Vec<Array1<f32>>,
}

impl TrackedObject {
    /// All points are currently live. A single occluded point disqualifies
    /// the whole object.
    pub fn is_live(&self) -> bool {
        self.live_points.iter().all(|&live| live)
    }

    pub fn rect(&self) -> Option<Rect> {
        Rect::from_estimate(self.estimate.view())
    }

    /// Median over past detections of each detection's median score.
    ///
    /// Empty score sets are skipped; `None` when nothing is left.
    pub fn confidence(&self) -> Option<f32> {
        let per_detection: Vec<f32> = self
            .past_scores
            .iter()
            .filter_map(|scores| median(scores.iter().copied()))
            .collect();
        median(per_detection)
    }
}

/// Median with the midpoint average for even lengths. NaN values are ignored.
pub(crate) fn median(values: impl IntoIterator<Item = f32>) -> Option<f32> {
    let mut values: Vec<f32> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
