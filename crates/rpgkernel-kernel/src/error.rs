//! The single error taxonomy every tool handler returns, per `spec.md` §7.
//!
//! Lower-crate errors convert in at the handler boundary via `#[from]`;
//! handlers themselves never match on a lower-crate error variant directly.

use rpgkernel_combat::CombatError;
use rpgkernel_db::DbError;
use rpgkernel_dice::DiceError;
use rpgkernel_mappatch::PatchError;
use rpgkernel_spatial::SpatialError;
use rpgkernel_world::WorldGenError;
use thiserror::Error;

/// The error kind string surfaced to callers alongside the human-readable message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Ill-formed input: bad argument shape, out-of-range value, empty required field.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is illegal in the target's current state (no active
    /// encounter, encounter already completed, etc).
    #[error("illegal state: {0}")]
    State(String),

    /// An action-economy slot (action/bonus action/reaction) was already spent.
    #[error("action economy: {0}")]
    ActionEconomy(String),

    /// A movement request exceeded remaining movement or crossed impassable terrain.
    #[error("movement error: {0}")]
    Movement(String),

    /// A pathfinding or geometry query failed.
    #[error("spatial error: {0}")]
    Spatial(String),

    /// A game-rules conflict: e.g. starting a second concentration effect.
    #[error("rules violation: {0}")]
    Rules(String),

    /// A uniqueness or prerequisite conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The persistence layer failed to read or write.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The transport layer's deadline expired before the handler returned.
    #[error("call timed out")]
    Timeout,
}

impl KernelError {
    /// The short error-kind string recorded in the tool response envelope.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Validation",
            Self::NotFound(_) => "NotFound",
            Self::State(_) => "State",
            Self::ActionEconomy(_) => "ActionEconomy",
            Self::Movement(_) => "Movement",
            Self::Spatial(_) => "Spatial",
            Self::Rules(_) => "Rules",
            Self::Conflict(_) => "Conflict",
            Self::Persistence(_) => "Persistence",
            Self::Timeout => "Timeout",
        }
    }
}

impl From<DiceError> for KernelError {
    fn from(err: DiceError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<SpatialError> for KernelError {
    fn from(err: SpatialError) -> Self {
        Self::Spatial(err.to_string())
    }
}

impl From<WorldGenError> for KernelError {
    fn from(err: WorldGenError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PatchError> for KernelError {
    fn from(err: PatchError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<DbError> for KernelError {
    fn from(err: DbError) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<CombatError> for KernelError {
    fn from(err: CombatError) -> Self {
        match err {
            CombatError::ParticipantNotFound(_) => Self::NotFound(err.to_string()),
            CombatError::EncounterNotActive | CombatError::NotYourTurn(_) => Self::State(err.to_string()),
            CombatError::ActionEconomyExhausted { .. } => Self::ActionEconomy(err.to_string()),
            CombatError::InsufficientMovement { .. } => Self::Movement(err.to_string()),
            CombatError::Spatial(_) => Self::Spatial(err.to_string()),
            CombatError::Incapacitated(_) | CombatError::NoConcentration(_) => Self::Rules(err.to_string()),
            CombatError::Dice(_) => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combat_error_kinds_map_as_documented_in_spec_7() {
        let not_found: KernelError = CombatError::ParticipantNotFound(rpgkernel_types::ParticipantId::new()).into();
        assert_eq!(not_found.kind(), "NotFound");

        let state: KernelError = CombatError::EncounterNotActive.into();
        assert_eq!(state.kind(), "State");

        let economy: KernelError = CombatError::ActionEconomyExhausted {
            slot: "action",
            participant: rpgkernel_types::ParticipantId::new(),
        }
        .into();
        assert_eq!(economy.kind(), "ActionEconomy");
    }

    #[test]
    fn db_errors_are_persistence_errors() {
        let err: KernelError = DbError::NotFound { entity: "world", id: "x".to_owned() }.into();
        assert_eq!(err.kind(), "Persistence");
    }
}
