//! Error taxonomy for world generation.

use thiserror::Error;

/// Errors produced while generating a world.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldGenError {
    /// `width` or `height` was zero.
    #[error("world dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// The seed string was empty.
    #[error("world seed must not be empty")]
    EmptySeed,

    /// `land_ratio` fell outside `(0.0, 1.0)`.
    #[error("land_ratio must be strictly between 0 and 1, got {0}")]
    InvalidLandRatio(String),
}
