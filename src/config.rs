//! Engine configuration, loadable from TOML.
//!
//! Every field is optional; missing ones take the defaults below.
//!
//! ```toml
//! [classifier]
//! min_age = 2
//! min_score = 0.05
//!
//! [motion]
//! window = 5
//! distance_threshold = 3.0
//!
//! [slots]
//! capacity = 10
//! countdown_frames = 36
//! leaving_offset_pct = 1.0
//! ttl_seconds = 3.0
//! reappear_offset_pct = 5.0
//!
//! [zone]
//! leftmost = [20.0, 400.0]
//! rightmost = [1260.0, 400.0]
//! topmost = [640.0, 440.0]
//! bottommost = [640.0, 650.0]
//!
//! [recalibration]
//! enabled = false
//! delay_frames = 30
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{OccupancyError, Result};
use crate::occupancy::{ClassifierConfig, SlotTableConfig, ZoneBoundaries};

/// Motion heuristic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Frames of history considered
    pub window: u32,
    /// Mean per-frame displacement in pixels above which an object moves
    pub distance_threshold: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            window: 5,
            distance_threshold: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecalibrationConfig {
    pub enabled: bool,
    pub delay_frames: u32,
}

impl Default for RecalibrationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_frames: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub classifier: ClassifierConfig,
    pub motion: MotionConfig,
    pub slots: SlotTableConfig,
    pub zone: ZoneBoundaries,
    pub recalibration: RecalibrationConfig,
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| OccupancyError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<()> {
        self.slots.validate()?;
        self.zone.validate()?;
        let threshold = f64::from(self.motion.distance_threshold);
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(OccupancyError::InvalidParameter {
                name: "distance_threshold",
                value: threshold,
            });
        }
        Ok(())
    }
}
