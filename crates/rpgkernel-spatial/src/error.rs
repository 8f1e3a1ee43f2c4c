//! Error taxonomy for grid and geometry operations.

use thiserror::Error;
use rpgkernel_types::Position;

/// Errors produced while resolving grid queries.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SpatialError {
    /// `findPath` could not reach the goal from the start (blocked or unreachable).
    #[error("no path from {from:?} to {to:?}")]
    Unreachable {
        /// Path start.
        from: Position,
        /// Path goal.
        to: Position,
    },

    /// The start tile itself is an obstacle.
    #[error("start position {0:?} is blocked")]
    StartBlocked(Position),

    /// The goal tile itself is an obstacle.
    #[error("goal position {0:?} is blocked")]
    GoalBlocked(Position),
}
