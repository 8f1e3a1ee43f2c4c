//! Enumeration types shared across the kernel.
//!
//! Mirrors `spec.md` §3's data model and §6's biome matrix; grouped the way
//! `emergence-types::enums` groups its resource/action/event taxonomies.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// World / biome
// ---------------------------------------------------------------------------

/// A biome assigned by the closed temperature x moisture lookup matrix in
/// `rpgkernel-world::biome`, or forced to `Ocean` below sea level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Biome {
    /// elevation < 20, regardless of temperature/moisture.
    Ocean,
    /// Coastal shallows, just above sea level.
    Beach,
    /// Hot, arid.
    Desert,
    /// Hot, high moisture, dense canopy.
    Rainforest,
    /// Hot, very high moisture, standing water.
    Swamp,
    /// Warm, low moisture.
    Savanna,
    /// Warm, moderate moisture.
    Woodland,
    /// Warm, high moisture.
    TropicalForest,
    /// Temperate, low moisture.
    Plains,
    /// Temperate, moderate moisture.
    Forest,
    /// Temperate, high moisture.
    Marsh,
    /// Cool, low moisture.
    Steppe,
    /// Cool, moderate moisture.
    Taiga,
    /// Cool, high moisture.
    Bog,
    /// Cold, low moisture.
    Tundra,
    /// Cold, high moisture (frozen standing water regions).
    Glacier,
    /// High elevation regardless of band (handled separately from the matrix
    /// by callers that wish to layer a mountain override; the matrix itself
    /// never emits this — reserved for future ridge/elevation overlays).
    Mountain,
}

/// Region classification. `spec.md` §3 leaves this as `{kingdom, wilderness, ...}`
/// (an open set); the kernel closes it to the set regions are actually
/// segmented into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RegionType {
    /// Settled, structure-dense region.
    Kingdom,
    /// Unclaimed, structure-sparse region.
    Wilderness,
    /// Region dominated by a single large water biome.
    Waterbody,
    /// High-elevation, low-habitability region.
    Highlands,
}

/// Structure archetype, per `spec.md` §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StructureType {
    /// Large settlement near coast and river confluence.
    City,
    /// Mid-size settlement on a river.
    Town,
    /// Small settlement in a habitable biome.
    Village,
    /// Fortified structure.
    Castle,
    /// Abandoned structure.
    Ruins,
    /// Subterranean or otherwise enclosed danger site.
    Dungeon,
    /// Religious structure.
    Temple,
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Damage type, used for resistance/vulnerability/immunity lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DamageType {
    /// Blunt-force damage.
    Bludgeoning,
    /// Piercing damage.
    Piercing,
    /// Edged damage.
    Slashing,
    /// Elemental fire damage.
    Fire,
    /// Elemental cold damage.
    Cold,
    /// Elemental lightning damage.
    Lightning,
    /// Acid damage.
    Acid,
    /// Poison damage.
    Poison,
    /// Psychic damage.
    Psychic,
    /// Necrotic damage.
    Necrotic,
    /// Radiant damage.
    Radiant,
    /// Force damage.
    Force,
    /// Thunder damage.
    Thunder,
}

/// Condition type, per `spec.md` §3 and the authoritative effects table in §4.D.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConditionType {
    /// Prone: melee attacks against have advantage, ranged disadvantage; own attacks disadvantage.
    Prone,
    /// Restrained: speed 0; attacks against have advantage; own attacks disadvantage.
    Restrained,
    /// Stunned: cannot act or react; attacks against have advantage; auto-fail str/dex saves.
    Stunned,
    /// Paralyzed: same incapacitation profile as Stunned.
    Paralyzed,
    /// Unconscious: same incapacitation profile as Stunned.
    Unconscious,
    /// Petrified: same incapacitation profile as Stunned.
    Petrified,
    /// Grappled: speed 0 until ended.
    Grappled,
    /// Blinded: cannot see; own attacks disadvantage; attacks against have advantage.
    Blinded,
    /// Deafened: cannot hear. No attack-roll effect; callers may gate hearing-based checks.
    Deafened,
    /// Frightened: disadvantage on attacks/ability checks while the fear source is in sight.
    Frightened,
    /// Poisoned: disadvantage on attacks and ability checks.
    Poisoned,
    /// Invisible: own attacks have advantage; attacks against have disadvantage.
    Invisible,
}

/// How a condition's duration is tracked and cleared, per `spec.md` §4.D.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DurationType {
    /// Decrements at the start of the owner's turn; expires at 0.
    Rounds,
    /// Removed at the start of the owner's turn, after its effects fire.
    StartOfTurn,
    /// Removed at the end of the owner's turn, after its effects fire.
    EndOfTurn,
    /// A saving throw at the end of the owner's turn may end it early.
    SaveEnds,
    /// Persists until explicitly removed.
    Permanent,
}

/// Which ability governs a saving throw or a modifier, per `spec.md`'s stat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ability {
    /// Strength.
    Str,
    /// Dexterity.
    Dex,
    /// Constitution.
    Con,
    /// Intelligence.
    Int,
    /// Wisdom.
    Wis,
    /// Charisma.
    Cha,
}

/// A combat action kind, per `spec.md` §4.D.4 and the §6 tool surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Consumes the action slot; resolves an attack roll.
    Attack,
    /// Consumes the action slot; restores hit points.
    Heal,
    /// Consumes movement only (no action-slot cost by itself).
    Move,
    /// Consumes the action slot; doubles remaining movement.
    Dash,
    /// Consumes the action slot; grants immunity to opportunity attacks this turn.
    Disengage,
    /// Consumes the reaction slot; triggered, not chosen freely.
    OpportunityAttack,
}

/// Classification of a `checkDegree` roll against a DC, per `spec.md` §4.A.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CheckDegree {
    /// Natural 1, or total <= DC - 10.
    CriticalFailure,
    /// Total < DC (and not a critical failure).
    Failure,
    /// Total >= DC (and not a critical success).
    Success,
    /// Natural 20, or total >= DC + 10.
    CriticalSuccess,
}

/// Encounter lifecycle status, per `spec.md` §3/§4.D.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EncounterStatus {
    /// Turns are being processed.
    Active,
    /// Ended via `endEncounter`; hp synced back to characters.
    Completed,
    /// Temporarily suspended (no turn processing, but not torn down).
    Paused,
}

// ---------------------------------------------------------------------------
// Audit / events
// ---------------------------------------------------------------------------

/// Topic a published [`crate::structs::Event`] belongs to, per `spec.md` §4.G.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// World generation / map patch events.
    World,
    /// Combat encounter events.
    Combat,
}

/// Tagged event payload kind. The `Event` struct pairs this with the
/// topic-appropriate details record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A world finished generating.
    WorldGenerated,
    /// A map patch committed.
    MapPatchApplied,
    /// An encounter was created and initiative rolled.
    EncounterStarted,
    /// An attack action resolved.
    AttackExecuted,
    /// A heal action resolved.
    HealExecuted,
    /// A move action resolved (including any opportunity attacks it triggered).
    MoveExecuted,
    /// A condition was applied to a participant.
    ConditionApplied,
    /// A condition expired or was removed from a participant.
    ConditionRemoved,
    /// Concentration ended (voluntarily, by damage, or by incapacitation).
    ConcentrationEnded,
    /// The turn advanced to the next participant (and possibly the next round).
    TurnAdvanced,
    /// The encounter ended and participant hp synced back to characters.
    EncounterEnded,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn enums_round_trip_json() {
        let biome = Biome::Rainforest;
        let json = serde_json::to_string(&biome).expect("serialize");
        let back: Biome = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(biome, back);
    }
}
