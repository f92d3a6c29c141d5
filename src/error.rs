//! Error types for tracking and scene memory.

use serde::Serialize;
use thiserror::Error;

/// Result type alias for the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by the frame-processing entry points.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("assignment failed: {0}")]
    Assignment(#[from] AssignmentError),

    /// Frames must arrive with strictly increasing indices. Replaying a
    /// frame is rejected rather than tolerated.
    #[error("frame {got} received after frame {previous}; frame indices must strictly increase")]
    FrameOrder { previous: u64, got: u64 },
}

/// Configuration inconsistencies, raised once at construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_hits must be at least 1")]
    InvalidMinHits,

    #[error("match_thresh must lie in (0, 1], got {0}")]
    InvalidMatchThresh(f32),

    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },

    #[error("{name} must be greater than zero")]
    NonPositive { name: &'static str },

    #[error("frame size must be finite and positive, got {width}x{height}")]
    InvalidFrameSize { width: f32, height: f32 },
}

/// Why a single detection was dropped from a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum DetectionError {
    #[error("bounding box has non-finite coordinates")]
    NonFinite,

    #[error("bounding box is inverted (max corner lies before min corner)")]
    Inverted,

    #[error("bounding box has zero area")]
    Degenerate,

    #[error("confidence must be finite and within [0, 1]")]
    InvalidConfidence,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssignmentError {
    #[error("cost matrix entry ({row}, {col}) is not finite")]
    NonFiniteCost { row: usize, col: usize },

    #[error("assignment solver failed: {0}")]
    Solver(String),
}
