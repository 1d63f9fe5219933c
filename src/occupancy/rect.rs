use nalgebra::Point2;
use ndarray::ArrayView2;

/// Axis-aligned box built from a tracker's two-point estimate.
///
/// Pixel space: x grows to the right, y grows downwards, so `bottom()` is the
/// edge closest to the floor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the box
    pub width: f32,
    /// Height of the box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from a `2x2` estimate whose rows are the top-left and
    /// bottom-right points.
    ///
    /// Returns `None` when the estimate does not have that shape.
    pub fn from_estimate(estimate: ArrayView2<'_, f32>) -> Option<Self> {
        if estimate.dim() != (2, 2) {
            return None;
        }
        Some(Self::from_tlbr(
            estimate[[0, 0]],
            estimate[[0, 1]],
            estimate[[1, 0]],
            estimate[[1, 1]],
        ))
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Center point; uses absolute extents so a flipped estimate still lands
    /// between its two points.
    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            self.x + self.width.abs() / 2.0,
            self.y + self.height.abs() / 2.0,
        )
    }

    /// y coordinate of the bottom edge.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Half the distance from the center to the bottom edge, roughly where
    /// the feet of a standing person meet the ground.
    #[inline]
    pub fn foot_offset(&self) -> f32 {
        (self.bottom() - self.center().y) / 2.0
    }
}
