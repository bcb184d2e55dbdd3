//! Error types for the decision engine.

use thiserror::Error;

use crate::board::{PlayerId, UnitId};
use crate::geometry::Position;

/// Result type alias using [`EngineError`].
pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error type for all decision engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Grid side length must be positive.
    #[error("Invalid grid size: {0}")]
    InvalidGridSize(u32),

    /// The host handed over a snapshot that breaks the board model.
    #[error("Invalid board snapshot: {0}")]
    InvalidSnapshot(String),

    /// Configuration values are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// The scoreboard has no entry for a player the engine needs.
    #[error("Scoreboard has no entry for player {0}")]
    MissingScore(PlayerId),

    /// A cell was claimed twice in the same turn.
    #[error("Position {position} already reserved this turn")]
    ReservationConflict {
        /// Cell that was already claimed.
        position: Position,
    },

    /// Step classification could not resolve the destination cell.
    #[error("Step classification failed for unit {unit} at {position}: {detail}")]
    ClassificationInvariant {
        /// Unit being planned.
        unit: UnitId,
        /// Destination cell under inspection.
        position: Position,
        /// What was inconsistent.
        detail: String,
    },

    /// A unit was handed a second action in the same turn.
    #[error("Unit {0} already has an action this turn")]
    AlreadyCommitted(UnitId),
}
