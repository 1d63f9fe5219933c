//! Error types for configuration and zone validation.

use std::path::PathBuf;

/// Errors raised while building or configuring the occupancy engine.
///
/// Per-frame processing never fails on its own; degenerate inputs resolve to
/// policy defaults instead.
#[derive(Debug, thiserror::Error)]
pub enum OccupancyError {
    /// The slot table needs at least one slot.
    #[error("slot capacity must be at least 1")]
    ZeroCapacity,

    /// Slots are allocated once; their number cannot change afterwards.
    #[error("slot capacity is fixed at {current}, cannot change to {requested}")]
    CapacityChanged { current: usize, requested: usize },

    /// Left boundary is not strictly left of the right boundary.
    #[error("zone is empty: left boundary {left} is not left of right boundary {right}")]
    EmptyZone { left: f32, right: f32 },

    /// A percentage or duration parameter is negative or not finite.
    #[error("invalid value {value} for `{name}`")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("failed to read config file {path}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    ParseConfig(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, OccupancyError>;
