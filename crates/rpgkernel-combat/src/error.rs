//! Error taxonomy for combat resolution.

use rpgkernel_dice::DiceError;
use rpgkernel_spatial::SpatialError;
use rpgkernel_types::ParticipantId;
use thiserror::Error;

/// Errors produced while resolving a combat action.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CombatError {
    /// No participant with the given id exists in the encounter.
    #[error("no participant {0} in this encounter")]
    ParticipantNotFound(ParticipantId),

    /// The encounter is not `Active` (it's `Paused` or `Completed`).
    #[error("encounter is not active")]
    EncounterNotActive,

    /// It is not this participant's turn.
    #[error("it is not participant {0}'s turn")]
    NotYourTurn(ParticipantId),

    /// The requested action-economy slot has already been spent this turn/round.
    #[error("{slot} already used this turn by participant {participant}")]
    ActionEconomyExhausted {
        /// Which slot was exhausted (`"action"`, `"bonus_action"`, `"reaction"`).
        slot: &'static str,
        /// The participant who exhausted it.
        participant: ParticipantId,
    },

    /// The participant does not have enough movement remaining for this step.
    #[error("participant {participant} has {remaining} feet remaining, needs {requested}")]
    InsufficientMovement {
        /// The participant attempting to move.
        participant: ParticipantId,
        /// Feet remaining.
        remaining: u32,
        /// Feet requested.
        requested: u32,
    },

    /// The participant is incapacitated (stunned/paralyzed/unconscious/petrified)
    /// and cannot take the requested action.
    #[error("participant {0} is incapacitated")]
    Incapacitated(ParticipantId),

    /// The participant is not currently concentrating on anything.
    #[error("participant {0} is not concentrating")]
    NoConcentration(ParticipantId),

    /// A spatial-geometry error propagated from `rpgkernel-spatial`.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// A dice-expression error propagated from `rpgkernel-dice`.
    #[error(transparent)]
    Dice(#[from] DiceError),
}
