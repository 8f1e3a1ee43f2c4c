//! Shared record types for the RPG simulation kernel.
//!
//! This crate has no logic of its own — every other crate in the workspace
//! depends on it for the identifiers, enums, and data-model structs defined
//! in `spec.md` §3, the same way `emergence-types` is the leaf dependency of
//! the teacher workspace.

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::{
    Ability, ActionKind, Biome, CheckDegree, ConditionType, DamageType, DurationType,
    EncounterStatus, EventKind, RegionType, StructureType, Topic,
};
pub use ids::{
    AuditEntryId, AuraId, CharacterId, ConditionId, EncounterId, ParticipantId, RegionId,
    RiverSegmentId, StructureId, WorldId,
};
pub use structs::{
    action_economy_slot, AbilityScores, AuditEntry, Aura, AuraEffect, AuraTrigger, Character,
    CombatState, Concentration, Condition, Event, OngoingEffect, Participant, Position, Region,
    RiverSegment, RollTrace, SpellSlotPool, Structure, Terrain, World, SEA_LEVEL,
};
