//! Core entity structs for the RPG simulation kernel, per `spec.md` §3.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{
    Ability, ActionKind, Biome, ConditionType, DamageType, DurationType, EncounterStatus,
    EventKind, RegionType, StructureType, Topic,
};
use crate::ids::{
    AuditEntryId, AuraId, CharacterId, ConditionId, EncounterId, ParticipantId, RegionId,
    RiverSegmentId, StructureId, WorldId,
};

// ---------------------------------------------------------------------------
// World / terrain
// ---------------------------------------------------------------------------

/// Sea level. Elevation below this is always `Biome::Ocean`, bypassing the
/// biome matrix, per `spec.md` §3/§6.
pub const SEA_LEVEL: i32 = 20;

/// A generated world. `seed` is the sole source of procedural entropy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// Stable identifier.
    pub id: WorldId,
    /// Display name.
    pub name: String,
    /// Sole source of procedural entropy for this world.
    pub seed: String,
    /// Width in tiles. Invariant: `>= 1`.
    pub width: u32,
    /// Height in tiles. Invariant: `>= 1`.
    pub height: u32,
    /// Deterministic simulation-clock timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Deterministic simulation-clock timestamp of last mutation.
    pub updated_at: DateTime<Utc>,
    /// Optional free-form environment descriptor (climate preset name, etc).
    pub environment: Option<String>,
}

/// A single grid cell's terrain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Owning world.
    pub world_id: WorldId,
    /// Grid x coordinate.
    pub x: i32,
    /// Grid y coordinate.
    pub y: i32,
    /// Assigned biome.
    pub biome: Biome,
    /// Integer elevation in `[0, 100]`.
    pub elevation: i32,
    /// Integer moisture in `[0, 100]`.
    pub moisture: i32,
    /// Integer temperature in `[-20, 40]`.
    pub temperature: i32,
}

/// A contiguous segmentation of land tiles sharing biome/elevation band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Stable identifier.
    pub id: RegionId,
    /// Owning world.
    pub world_id: WorldId,
    /// Deterministically-derived display name.
    pub name: String,
    /// Region classification.
    pub region_type: RegionType,
    /// Centroid x coordinate.
    pub center_x: i32,
    /// Centroid y coordinate.
    pub center_y: i32,
    /// Display color, `"#RRGGBB"`.
    pub color: String,
}

/// A directed edge in the river DAG, flowing strictly downhill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiverSegment {
    /// Stable identifier.
    pub id: RiverSegmentId,
    /// Owning world.
    pub world_id: WorldId,
    /// Upstream tile x.
    pub from_x: i32,
    /// Upstream tile y.
    pub from_y: i32,
    /// Downstream tile x.
    pub to_x: i32,
    /// Downstream tile y.
    pub to_y: i32,
    /// Accumulated flux at the upstream cell.
    pub flux: u32,
}

/// A placed settlement, ruin, or dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    /// Stable identifier.
    pub id: StructureId,
    /// Owning world.
    pub world_id: WorldId,
    /// Structure archetype.
    pub structure_type: StructureType,
    /// Grid x coordinate.
    pub x: i32,
    /// Grid y coordinate.
    pub y: i32,
    /// Display name.
    pub name: String,
    /// Population, for settlements that track one.
    pub population: Option<u32>,
}

// ---------------------------------------------------------------------------
// Characters
// ---------------------------------------------------------------------------

/// The six core ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    /// Strength.
    pub str_: i32,
    /// Dexterity.
    pub dex: i32,
    /// Constitution.
    pub con: i32,
    /// Intelligence.
    pub int: i32,
    /// Wisdom.
    pub wis: i32,
    /// Charisma.
    pub cha: i32,
}

impl AbilityScores {
    /// Standard D20 modifier: `floor((score - 10) / 2)`.
    #[must_use]
    pub fn modifier(&self, ability: Ability) -> i32 {
        let score = match ability {
            Ability::Str => self.str_,
            Ability::Dex => self.dex,
            Ability::Con => self.con,
            Ability::Int => self.int,
            Ability::Wis => self.wis,
            Ability::Cha => self.cha,
        };
        score.saturating_sub(10).div_euclid(2)
    }
}

/// A spell slot tier's current/max counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlotPool {
    /// Slots currently available.
    pub current: u32,
    /// Maximum slots at this tier.
    pub max: u32,
}

/// A persistent character definition (player or NPC), per `spec.md` §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Stable identifier.
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// Ability scores.
    pub stats: AbilityScores,
    /// Character level.
    pub level: u32,
    /// Current hit points. Invariant: `>= 0`.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Armor class.
    pub ac: i32,
    /// Skill/attack proficiencies, by name.
    pub proficiencies: BTreeSet<String>,
    /// Abilities the character is proficient in saving throws for.
    pub save_proficiencies: BTreeSet<Ability>,
    /// Spell slots keyed by spell level (1-indexed).
    pub spell_slots: BTreeMap<u32, SpellSlotPool>,
    /// Damage types this character resists (half damage).
    pub resistances: BTreeSet<DamageType>,
    /// Damage types this character is vulnerable to (double damage).
    pub vulnerabilities: BTreeSet<DamageType>,
    /// Damage types this character is immune to (zero damage).
    pub immunities: BTreeSet<DamageType>,
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// Integer grid position, 5-foot tile convention (see `rpgkernel-spatial`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Grid x coordinate.
    pub x: i32,
    /// Grid y coordinate.
    pub y: i32,
}

/// An effect that fires automatically on a condition's trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OngoingEffect {
    /// `start_of_turn` or `end_of_turn`.
    pub trigger: DurationType,
    /// Whether this deals damage or restores hit points.
    pub is_damage: bool,
    /// Flat amount, if not dice-driven.
    pub amount: Option<i32>,
    /// Dice expression (e.g. `"2d6"`), if dice-driven.
    pub dice: Option<String>,
}

/// A status effect applied to a [`Participant`], per `spec.md` §3/§4.D.5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Stable identifier.
    pub id: ConditionId,
    /// Condition archetype, governing its mechanical effects.
    pub condition_type: ConditionType,
    /// How the duration is tracked and cleared.
    pub duration_type: DurationType,
    /// Remaining rounds, only meaningful for `DurationType::Rounds`.
    pub duration: Option<u32>,
    /// Save DC, only meaningful for `DurationType::SaveEnds`.
    pub save_dc: Option<i32>,
    /// Save ability, only meaningful for `DurationType::SaveEnds`.
    pub save_ability: Option<Ability>,
    /// Effects that fire on this condition's trigger points.
    pub ongoing_effects: Vec<OngoingEffect>,
}

/// An in-encounter shadow of a [`Character`], bounded to the encounter's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier, scoped to the encounter.
    pub id: ParticipantId,
    /// Source character, if this participant was copied in from one.
    pub source_character_id: Option<CharacterId>,
    /// Display name.
    pub name: String,
    /// Flat bonus added to initiative rolls.
    pub initiative_bonus: i32,
    /// Rolled initiative total (bonus included).
    pub initiative: i32,
    /// Whether this participant is hostile to the player side.
    pub is_enemy: bool,
    /// Current hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Active conditions.
    pub conditions: Vec<Condition>,
    /// Grid position, if placed on a map.
    pub position: Option<Position>,
    /// Base movement speed in feet.
    pub movement_speed: u32,
    /// Movement remaining this turn, in feet.
    pub movement_remaining: u32,
    /// Whether the action slot has been used this turn.
    pub action_used: bool,
    /// Whether the bonus-action slot has been used this turn.
    pub bonus_action_used: bool,
    /// Whether the reaction slot has been used this round.
    pub reaction_used: bool,
    /// Whether `Dash` has been used this turn.
    pub has_dashed: bool,
    /// Whether `Disengage` has been used this turn.
    pub has_disengaged: bool,
    /// Whether the free-interaction slot has been used this turn.
    pub free_interaction_used: bool,
    /// Damage types this participant resists.
    pub resistances: BTreeSet<DamageType>,
    /// Damage types this participant is vulnerable to.
    pub vulnerabilities: BTreeSet<DamageType>,
    /// Damage types this participant is immune to.
    pub immunities: BTreeSet<DamageType>,
}

/// Obstacles and difficult terrain for an encounter's battle map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    /// Cells that block movement and line of sight.
    pub obstacles: BTreeSet<(i32, i32)>,
    /// Cells that cost double movement to enter.
    pub difficult_terrain: BTreeSet<(i32, i32)>,
}

/// The full state of a combat encounter, per `spec.md` §3/§4.D.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    /// Stable identifier.
    pub id: EncounterId,
    /// Owning world, if the encounter is tied to one.
    pub world_id: Option<WorldId>,
    /// All participants, keyed by insertion order (not turn order).
    pub participants: Vec<Participant>,
    /// Participant IDs in initiative order. A permutation of `participants`' IDs.
    pub turn_order: Vec<ParticipantId>,
    /// Index into `turn_order` for whoever's turn it is.
    pub current_turn_index: usize,
    /// Current round number, starting at 1.
    pub round: u32,
    /// Battle-map terrain, if any.
    pub terrain: Option<Terrain>,
    /// Deterministic simulation-clock timestamp of creation.
    pub created_at: DateTime<Utc>,
    /// Deterministic simulation-clock timestamp of last mutation.
    pub updated_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: EncounterStatus,
    /// Active concentration slots, at most one per participant.
    pub concentrations: Vec<Concentration>,
    /// Live auras, per `spec.md` §4.D.7.
    pub auras: Vec<Aura>,
}

/// A trigger point at which an [`Aura`]'s effects may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraTrigger {
    /// Fires when a participant enters the aura's radius.
    Enter,
    /// Fires when a participant leaves the aura's radius.
    Exit,
    /// Fires at the start of the aura owner's turn.
    StartOfTurn,
    /// Fires at the end of the aura owner's turn.
    EndOfTurn,
}

/// An effect an [`Aura`] applies to affected participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraEffect {
    /// When this effect fires.
    pub trigger: AuraTrigger,
    /// Whether this deals damage or restores hit points.
    pub is_damage: bool,
    /// Flat amount, if not dice-driven.
    pub amount: Option<i32>,
    /// Dice expression, if dice-driven.
    pub dice: Option<String>,
    /// Save DC to halve/negate the effect, if any.
    pub save_dc: Option<i32>,
    /// Save ability, if `save_dc` is set.
    pub save_ability: Option<Ability>,
}

/// A radius-of-effect zone tied to a concentrating caster, per `spec.md` §4.D.7.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aura {
    /// Stable identifier.
    pub id: AuraId,
    /// Owning participant.
    pub owner_id: ParticipantId,
    /// Name of the spell/effect this aura represents.
    pub spell_name: String,
    /// Spell level, for concentration bookkeeping.
    pub spell_level: u32,
    /// Radius in feet.
    pub radius: u32,
    /// Whether the aura affects the owner.
    pub affects_self: bool,
    /// Whether the aura affects allies.
    pub affects_allies: bool,
    /// Whether the aura affects enemies.
    pub affects_enemies: bool,
    /// Effects indexed by trigger.
    pub effects: Vec<AuraEffect>,
    /// Whether losing concentration ends this aura.
    pub requires_concentration: bool,
    /// Round the aura started.
    pub started_at_round: u32,
    /// Maximum duration in rounds, if bounded.
    pub max_duration_rounds: Option<u32>,
}

/// The active concentration slot for a character, at most one per character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concentration {
    /// The concentrating participant.
    pub participant_id: ParticipantId,
    /// Name of the spell being concentrated on.
    pub spell_name: String,
    /// Aura IDs owned by this concentration, removed together when it ends.
    pub aura_ids: Vec<AuraId>,
}

// ---------------------------------------------------------------------------
// Audit / events
// ---------------------------------------------------------------------------

/// A single recorded tool invocation, per `spec.md` §3/§4.G.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Stable identifier.
    pub id: AuditEntryId,
    /// Tool/action name invoked.
    pub action: String,
    /// Arguments passed to the handler, as JSON.
    pub arguments: serde_json::Value,
    /// Result payload, as JSON, if the call succeeded.
    pub result: Option<serde_json::Value>,
    /// Error kind + message, if the call failed.
    pub error: Option<String>,
    /// Wall-clock-independent duration in milliseconds (simulation-clock delta).
    pub duration_ms: u64,
    /// Deterministic simulation-clock timestamp.
    pub timestamp: DateTime<Utc>,
    /// Caller-supplied correlation id, if provided.
    pub request_id: Option<String>,
}

/// A tagged event published on the bus, per `spec.md` §3/§4.G.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Topic this event belongs to.
    pub topic: Topic,
    /// Specific event kind within the topic.
    pub kind: EventKind,
    /// Type-specific payload.
    pub payload: serde_json::Value,
    /// Deterministic simulation-clock timestamp.
    pub timestamp: DateTime<Utc>,
}

/// A fully-resolved roll, attached to attack/heal/save events for replay and audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollTrace {
    /// The dice expression that produced this roll (`"1d20+5"`, `"2d6"`, ...).
    pub expression: String,
    /// Individual die results, in roll order.
    pub dice: Vec<i32>,
    /// Flat modifier applied after summing dice.
    pub modifier: i32,
    /// `sum(dice) + modifier`.
    pub total: i32,
}

/// Which action-economy slot an [`ActionKind`] consumes.
#[must_use]
pub const fn action_economy_slot(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Attack | ActionKind::Heal | ActionKind::Dash | ActionKind::Disengage => {
            "action"
        }
        ActionKind::Move => "movement",
        ActionKind::OpportunityAttack => "reaction",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn ability_modifier_matches_d20_table() {
        let stats = AbilityScores {
            str_: 18,
            dex: 10,
            con: 8,
            int: 20,
            wis: 1,
            cha: 13,
        };
        assert_eq!(stats.modifier(Ability::Str), 4);
        assert_eq!(stats.modifier(Ability::Dex), 0);
        assert_eq!(stats.modifier(Ability::Con), -1);
        assert_eq!(stats.modifier(Ability::Int), 5);
        assert_eq!(stats.modifier(Ability::Wis), -5);
        assert_eq!(stats.modifier(Ability::Cha), 1);
    }

    #[test]
    fn world_roundtrips_json() {
        let world = World {
            id: WorldId::new(),
            name: "Test".to_owned(),
            seed: "seed-1".to_owned(),
            width: 10,
            height: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            environment: None,
        };
        let json = serde_json::to_string(&world).expect("serialize world");
        let back: World = serde_json::from_str(&json).expect("deserialize world");
        assert_eq!(world, back);
    }
}
