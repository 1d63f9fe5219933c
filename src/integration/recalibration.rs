//! Delayed zone recalibration triggered by newcomers.

use crate::config::RecalibrationConfig;

/// Arms a countdown when a new person enters so calibration runs once they
/// have walked into view, then fires exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecalibrationScheduler {
    enabled: bool,
    /// Frames between the new-person signal and calibration
    delay_frames: u32,
    remaining: Option<u32>,
}

impl RecalibrationScheduler {
    pub fn new(enabled: bool, delay_frames: u32) -> Self {
        Self {
            enabled,
            delay_frames,
            remaining: None,
        }
    }

    pub fn from_config(config: &RecalibrationConfig) -> Self {
        Self::new(config.enabled, config.delay_frames)
    }

    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    /// Advance one frame. Returns true on the frame calibration should run.
    ///
    /// New-person signals while armed are ignored.
    pub fn on_frame(&mut self, new_person: bool) -> bool {
        if !self.enabled {
            return false;
        }
        match self.remaining {
            None if new_person => {
                tracing::debug!(delay = self.delay_frames, "recalibration armed");
                self.remaining = Some(self.delay_frames);
                false
            }
            None => false,
            Some(0) => {
                tracing::info!("recalibration due");
                self.remaining = None;
                true
            }
            Some(frames) => {
                self.remaining = Some(frames - 1);
                false
            }
        }
    }
}
