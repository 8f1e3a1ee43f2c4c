//! The tool-call surface, per `spec.md` §6: one handler per row of the tool
//! table, each wrapped in [`KernelContext::record`] for audit logging, each
//! appending its topic-appropriate event to the durable log, and each
//! publishing that event to the in-process bus before returning.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use rpgkernel_combat::{
    advance_turn, apply_concentration_damage_check, apply_healing, create_encounter as build_encounter,
    current_participant, end_encounter, provokes_opportunity_attack, reevaluate_auras_for_move, resolve_attack,
    resolve_dash, resolve_disengage, resolve_heal, resolve_opportunity_attack, CombatError,
};
use rpgkernel_dice::{roll_expr, DeterministicRng};
use rpgkernel_mappatch::{apply as apply_patch, preview as preview_patch, PatchTarget};
use rpgkernel_spatial::{find_path, tiles_to_feet};
use rpgkernel_types::{
    ActionKind, CombatState, DamageType, EncounterId, EncounterStatus, Event, EventKind,
    Participant, ParticipantId, Position, Terrain, Topic, WorldId,
};
use rpgkernel_world::generate_world;
use serde::{Deserialize, Serialize};

use crate::config::CombatDefaults;
use crate::context::KernelContext;
use crate::error::KernelError;

/// The envelope every tool call returns: human-readable prose plus an
/// optional machine-readable state block, per spec.md §6.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    /// Human-readable summary of the call's outcome.
    pub text: String,
    /// Structured state for machine consumers, serialized from the same
    /// data the `text` field describes.
    pub state_json: Option<serde_json::Value>,
}

impl ToolResponse {
    fn with_state<T: Serialize>(text: impl Into<String>, state: &T) -> Result<Self, KernelError> {
        let state_json = serde_json::to_value(state).map_err(|err| KernelError::Validation(err.to_string()))?;
        Ok(Self { text: text.into(), state_json: Some(state_json) })
    }
}

// ---------------------------------------------------------------------------
// world.generate
// ---------------------------------------------------------------------------

/// Arguments for `world.generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldGenerateArgs {
    /// Display name for the new world.
    pub name: String,
    /// Sole source of procedural entropy.
    pub seed: String,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Target fraction of tiles at or above sea level; falls back to
    /// [`crate::config::KernelConfig::world_gen`] when omitted.
    pub land_ratio: Option<f64>,
    /// Perlin octave count; falls back to the configured default when omitted.
    pub octaves: Option<u32>,
}

/// Generate a new world and persist it in full.
///
/// # Errors
/// Returns [`KernelError::Validation`] for invalid dimensions/seed/ratio, or
/// [`KernelError::Persistence`] if any part of the write fails.
pub async fn world_generate(
    ctx: &KernelContext,
    args: WorldGenerateArgs,
    defaults: &rpgkernel_world::WorldGenConfig,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::to_value(&args).map_err(|err| KernelError::Validation(err.to_string()))?;
    ctx.record("world_generate", arguments, request_id, || async move {
        let mut config = *defaults;
        if let Some(land_ratio) = args.land_ratio {
            config.land_ratio = land_ratio;
        }
        if let Some(octaves) = args.octaves {
            config.octaves = octaves;
        }

        let generated =
            generate_world(&args.name, &args.seed, args.width, args.height, &config, Utc::now())?;

        ctx.store().create_world(&generated.world).await?;
        ctx.store().save_tiles(&generated.tiles).await?;
        ctx.store().save_regions(&generated.regions).await?;
        ctx.store().save_rivers(&generated.rivers).await?;
        ctx.store().save_structures(&generated.structures).await?;

        let event = Event {
            topic: Topic::World,
            kind: EventKind::WorldGenerated,
            payload: serde_json::json!({ "worldId": generated.world.id, "tileCount": generated.tiles.len() }),
            timestamp: Utc::now(),
        };
        ctx.store().append_event(&event).await?;
        ctx.events().publish(&event);

        ToolResponse::with_state(
            format!(
                "generated world {} ({}x{}, {} structures, {} river segments)",
                generated.world.id,
                generated.world.width,
                generated.world.height,
                generated.structures.len(),
                generated.rivers.len()
            ),
            &generated,
        )
    })
    .await
}

// ---------------------------------------------------------------------------
// world.getState
// ---------------------------------------------------------------------------

/// Summary of a world's persisted state, per spec.md §6's `world.getState` contract.
#[derive(Debug, Clone, Serialize)]
pub struct WorldStateSummary {
    /// The world's id.
    pub world_id: WorldId,
    /// Display name.
    pub name: String,
    /// Generation seed.
    pub seed: String,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Tile count per biome.
    pub biome_histogram: BTreeMap<String, u32>,
    /// Number of placed structures.
    pub structure_count: usize,
}

/// Fetch a summary of a world's current state.
///
/// # Errors
/// Returns [`KernelError::NotFound`] if no world with `world_id` exists.
pub async fn world_get_state(
    ctx: &KernelContext,
    world_id: WorldId,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::json!({ "worldId": world_id });
    ctx.record("world_get_state", arguments, request_id, || async move {
        let world = ctx.store().get_world(world_id).await?;
        let tiles = ctx.store().list_tiles(world_id).await?;
        let structures = ctx.store().list_structures(world_id).await?;

        let mut biome_histogram = BTreeMap::new();
        for tile in &tiles {
            let count = biome_histogram.entry(format!("{:?}", tile.biome)).or_insert(0_u32);
            *count = count.saturating_add(1);
        }

        let summary = WorldStateSummary {
            world_id: world.id,
            name: world.name,
            seed: world.seed,
            width: world.width,
            height: world.height,
            biome_histogram,
            structure_count: structures.len(),
        };
        ToolResponse::with_state(
            format!("world {world_id} has {} structures across {} tiles", summary.structure_count, tiles.len()),
            &summary,
        )
    })
    .await
}

// ---------------------------------------------------------------------------
// world.mapPatch.preview / world.mapPatch.apply
// ---------------------------------------------------------------------------

async fn load_patch_target(ctx: &KernelContext, world_id: WorldId) -> Result<PatchTarget, KernelError> {
    let world = ctx.store().get_world(world_id).await?;
    let tiles = ctx.store().list_tiles(world_id).await?;
    let structures = ctx.store().list_structures(world_id).await?;
    Ok(PatchTarget {
        world_id,
        width: world.width,
        height: world.height,
        tiles: tiles.into_iter().map(|tile| ((tile.x, tile.y), tile)).collect(),
        structures,
        roads: BTreeSet::new(),
        annotations: Vec::new(),
    })
}

/// Preview a map patch script against a world without mutating it.
///
/// # Errors
/// Returns [`KernelError::Validation`] if the script fails to parse or a
/// command would fail, or [`KernelError::NotFound`] if the world doesn't exist.
pub async fn map_patch_preview(
    ctx: &KernelContext,
    world_id: WorldId,
    script: String,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::json!({ "worldId": world_id, "script": script });
    ctx.record("map_patch_preview", arguments, request_id, || async move {
        let target = load_patch_target(ctx, world_id).await?;
        let (patch, will_modify, diff) = preview_patch(&target, &script)?;
        ToolResponse::with_state(
            format!("previewed {} command(s); willModify={will_modify}", patch.commands.len()),
            &serde_json::json!({ "commandsDecoded": patch.commands.len(), "willModify": will_modify, "diff": diff }),
        )
    })
    .await
}

/// Apply a map patch script to a world, atomically.
///
/// # Errors
/// Returns [`KernelError::Validation`] if the script fails to parse or a
/// command fails, or [`KernelError::Persistence`] if the write-back fails.
/// Either way the world's persisted state is unchanged.
pub async fn map_patch_apply(
    ctx: &KernelContext,
    world_id: WorldId,
    script: String,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::json!({ "worldId": world_id, "script": script });
    ctx.record("map_patch_apply", arguments, request_id, || async move {
        let mut target = load_patch_target(ctx, world_id).await?;
        let diff = apply_patch(&mut target, &script)?;

        ctx.store().save_tiles(&target.tiles.values().copied().collect::<Vec<_>>()).await?;
        ctx.store().save_structures(&target.structures).await?;

        let event = Event {
            topic: Topic::World,
            kind: EventKind::MapPatchApplied,
            payload: serde_json::json!({ "worldId": world_id, "diff": diff }),
            timestamp: Utc::now(),
        };
        ctx.store().append_event(&event).await?;
        ctx.events().publish(&event);

        ToolResponse::with_state(
            format!(
                "applied patch: +{} tiles, +{} structures",
                diff.tiles_added.saturating_add(diff.tiles_changed),
                diff.structures_added
            ),
            &diff,
        )
    })
    .await
}

// ---------------------------------------------------------------------------
// combat.createEncounter
// ---------------------------------------------------------------------------

/// One participant as supplied to `combat.createEncounter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantInput {
    /// Display name.
    pub name: String,
    /// Starting and maximum hit points.
    pub hp: i32,
    /// Maximum hit points.
    pub max_hp: i32,
    /// Flat bonus added to the initiative roll.
    pub initiative_bonus: i32,
    /// Whether this participant is hostile to the player side.
    pub is_enemy: bool,
    /// Base movement speed in feet; defaults to the configured combat default.
    pub movement_speed: Option<u32>,
    /// Starting grid position, if this encounter has a battle map.
    pub position: Option<Position>,
    /// Character this participant was copied in from, if any.
    pub source_character_id: Option<rpgkernel_types::CharacterId>,
}

/// Arguments for `combat.createEncounter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEncounterArgs {
    /// Deterministic seed for initiative rolls.
    pub seed: String,
    /// The participants to seat.
    pub participants: Vec<ParticipantInput>,
    /// Battle-map terrain, if any.
    pub terrain: Option<Terrain>,
    /// World this encounter is tied to, if any.
    pub world_id: Option<WorldId>,
}

/// Create an encounter: rolls initiative and seats the first turn.
///
/// # Errors
/// Returns [`KernelError::Validation`] if `participants` is empty.
pub async fn combat_create_encounter(
    ctx: &KernelContext,
    args: CreateEncounterArgs,
    default_movement_speed: u32,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::to_value(&args).map_err(|err| KernelError::Validation(err.to_string()))?;
    ctx.record("combat_create_encounter", arguments, request_id, || async move {
        if args.participants.is_empty() {
            return Err(KernelError::Validation("an encounter needs at least one participant".to_owned()));
        }

        let mut rng = DeterministicRng::from_seed(&args.seed);
        let participants = args
            .participants
            .into_iter()
            .map(|input| {
                let speed = input.movement_speed.unwrap_or(default_movement_speed);
                Participant {
                    id: ParticipantId::new(),
                    source_character_id: input.source_character_id,
                    name: input.name,
                    initiative_bonus: input.initiative_bonus,
                    initiative: 0,
                    is_enemy: input.is_enemy,
                    hp: input.hp,
                    max_hp: input.max_hp,
                    conditions: Vec::new(),
                    position: input.position,
                    movement_speed: speed,
                    movement_remaining: speed,
                    action_used: false,
                    bonus_action_used: false,
                    reaction_used: false,
                    has_dashed: false,
                    has_disengaged: false,
                    free_interaction_used: false,
                    resistances: BTreeSet::new(),
                    vulnerabilities: BTreeSet::new(),
                    immunities: BTreeSet::new(),
                }
            })
            .collect();

        let encounter_id = EncounterId::new();
        let state =
            build_encounter(encounter_id, args.world_id, participants, args.terrain, &mut rng, Utc::now());
        ctx.insert_encounter(state.clone());
        ctx.store().create_encounter(&state).await?;

        let event = Event {
            topic: Topic::Combat,
            kind: EventKind::EncounterStarted,
            payload: serde_json::json!({ "encounterId": encounter_id, "turnOrder": state.turn_order }),
            timestamp: Utc::now(),
        };
        ctx.store().append_event(&event).await?;
        ctx.events().publish(&event);

        ToolResponse::with_state(
            format!("encounter {encounter_id} started, round {}, {} participants", state.round, state.participants.len()),
            &state,
        )
    })
    .await
}

// ---------------------------------------------------------------------------
// combat.getEncounterState
// ---------------------------------------------------------------------------

/// Fetch the full live state of an encounter.
///
/// # Errors
/// Returns [`KernelError::NotFound`] if no such encounter is live in this session.
pub async fn combat_get_encounter_state(
    ctx: &KernelContext,
    encounter_id: EncounterId,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::json!({ "encounterId": encounter_id });
    ctx.record("combat_get_encounter_state", arguments, request_id, || async move {
        let state = ctx.get_encounter(encounter_id)?;
        ToolResponse::with_state(format!("encounter {encounter_id}, round {}", state.round), &state)
    })
    .await
}

// ---------------------------------------------------------------------------
// combat.executeAction
// ---------------------------------------------------------------------------

/// Extra parameters an action needs beyond `actor`/`target`, keyed by
/// `action`'s kind. Unused fields for a given action are simply ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionParameters {
    /// Flat bonus added to an attack roll.
    pub attack_bonus: Option<i32>,
    /// Target's armor class.
    pub target_ac: Option<i32>,
    /// Damage expression (`"2d6+3"`), for attack.
    pub damage_expr: Option<String>,
    /// Damage type dealt, for attack.
    pub damage_type: Option<DamageType>,
    /// Whether the attack is melee (affects opportunity-attack eligibility upstream).
    pub is_melee: Option<bool>,
    /// Healing expression (`"2d8+2"`), for heal.
    pub heal_expr: Option<String>,
    /// Destination position, for move.
    pub to: Option<Position>,
}

/// Arguments for `combat.executeAction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteActionArgs {
    /// The live encounter.
    pub encounter_id: EncounterId,
    /// Which action kind to resolve.
    pub action: ActionKind,
    /// The acting participant.
    pub actor: ParticipantId,
    /// The action's target, where applicable (attack, heal).
    pub target: Option<ParticipantId>,
    /// Action-specific parameters.
    pub parameters: ActionParameters,
    /// Deterministic seed for this action's dice rolls.
    pub seed: String,
}

fn find_participant_mut<'a>(
    state: &'a mut CombatState,
    id: ParticipantId,
) -> Result<&'a mut Participant, KernelError> {
    state
        .participants
        .iter_mut()
        .find(|participant| participant.id == id)
        .ok_or_else(|| KernelError::NotFound(format!("no participant {id} in this encounter")))
}

/// Everyone hostile to `mover_id`, not incapacitated, whose reach `mover_id`
/// leaves by stepping from `from` to `to`, per `spec.md` §4.D.4 step 4.
fn opportunity_attackers(state: &CombatState, mover_id: ParticipantId, from: Position, to: Position) -> Vec<ParticipantId> {
    let Some(mover) = state.participants.iter().find(|participant| participant.id == mover_id) else {
        return Vec::new();
    };
    state
        .participants
        .iter()
        .filter(|watcher| watcher.id != mover_id && watcher.hp > 0 && watcher.is_enemy != mover.is_enemy)
        .filter(|watcher| {
            watcher
                .position
                .is_some_and(|watcher_position| provokes_opportunity_attack(mover, watcher, watcher_position, from, to))
        })
        .map(|watcher| watcher.id)
        .collect()
}

/// Resolve every opportunity attack `mover_id` provokes by stepping from
/// `from` to `to`, checking concentration for damage taken, and returning
/// whether `mover_id` dropped to 0 hp (the move must halt at `from`).
fn resolve_opportunity_attacks_for_step(
    state: &mut CombatState,
    mover_id: ParticipantId,
    from: Position,
    to: Position,
    defaults: &CombatDefaults,
    rng: &mut DeterministicRng,
    outcomes: &mut Vec<rpgkernel_combat::AttackOutcome>,
) -> Result<bool, KernelError> {
    for attacker_id in opportunity_attackers(state, mover_id, from, to) {
        let mover_index = state
            .participants
            .iter()
            .position(|participant| participant.id == mover_id)
            .ok_or_else(|| KernelError::NotFound(format!("no participant {mover_id}")))?;
        let attacker_index = state
            .participants
            .iter()
            .position(|participant| participant.id == attacker_id)
            .ok_or_else(|| KernelError::NotFound(format!("no participant {attacker_id}")))?;
        let (lower, upper) =
            if attacker_index < mover_index { (attacker_index, mover_index) } else { (mover_index, attacker_index) };

        let outcome = {
            let (left, right) = state.participants.split_at_mut(upper);
            #[allow(clippy::indexing_slicing)]
            let (attacker, mover) = if attacker_index < mover_index {
                (&mut left[lower], &mut right[0])
            } else {
                (&mut right[0], &mut left[lower])
            };
            resolve_opportunity_attack(
                attacker,
                mover,
                defaults.opportunity_attack_bonus,
                defaults.opportunity_attack_target_ac,
                &defaults.opportunity_attack_damage_expr,
                defaults.opportunity_attack_damage_type,
                rng,
            )?
        };

        if outcome.hit && outcome.damage_dealt > 0 {
            let mover_hp_after =
                state.participants.iter().find(|participant| participant.id == mover_id).map_or(0, |participant| participant.hp);
            apply_concentration_damage_check(state, mover_id, mover_hp_after, outcome.damage_dealt.abs(), rng)?;
        }

        let mover_died =
            state.participants.iter().find(|participant| participant.id == mover_id).is_some_and(|participant| participant.hp <= 0);
        outcomes.push(outcome);
        if mover_died {
            return Ok(true);
        }
    }
    Ok(false)
}

/// The result of resolving a move action: final position, any opportunity
/// attacks it provoked, and whether it halted early because the mover
/// dropped to 0 hp mid-path.
#[derive(Debug, Clone, Serialize)]
struct MoveOutcome {
    destination: Position,
    opportunity_attacks: Vec<rpgkernel_combat::AttackOutcome>,
    halted_early: bool,
}

/// Resolve one combat action (attack, heal, move, dash, or disengage).
///
/// # Errors
/// Returns [`KernelError::State`] if the encounter isn't active or it isn't
/// the actor's turn, [`KernelError::ActionEconomy`]/[`KernelError::Movement`]
/// if the requested action exceeds what the actor can still do this turn, or
/// [`KernelError::Validation`] if required `parameters` are missing.
pub async fn combat_execute_action(
    ctx: &KernelContext,
    args: ExecuteActionArgs,
    defaults: &CombatDefaults,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::to_value(&args).map_err(|err| KernelError::Validation(err.to_string()))?;
    ctx.record("combat_execute_action", arguments, request_id, || async move {
        let mut state = ctx.get_encounter(args.encounter_id)?;
        if state.status != EncounterStatus::Active {
            return Err(KernelError::State("encounter is not active".to_owned()));
        }
        let current = current_participant(&state)
            .map(|participant| participant.id)
            .ok_or_else(|| KernelError::State("encounter has no current participant".to_owned()))?;
        if current != args.actor {
            return Err(KernelError::State(format!("it is not participant {}'s turn", args.actor)));
        }

        let mut rng = DeterministicRng::from_seed(&args.seed);
        let (summary, event_kind) = match args.action {
            ActionKind::Attack => {
                let target_id = args
                    .target
                    .ok_or_else(|| KernelError::Validation("attack requires a target".to_owned()))?;
                let attack_bonus = args
                    .parameters
                    .attack_bonus
                    .ok_or_else(|| KernelError::Validation("attack requires attackBonus".to_owned()))?;
                let target_ac = args
                    .parameters
                    .target_ac
                    .ok_or_else(|| KernelError::Validation("attack requires targetAc".to_owned()))?;
                let damage_expr = args
                    .parameters
                    .damage_expr
                    .clone()
                    .ok_or_else(|| KernelError::Validation("attack requires damageExpr".to_owned()))?;
                let damage_type = args.parameters.damage_type.unwrap_or(DamageType::Bludgeoning);
                let is_melee = args.parameters.is_melee.unwrap_or(true);

                let actor_index = state
                    .participants
                    .iter()
                    .position(|participant| participant.id == args.actor)
                    .ok_or_else(|| KernelError::NotFound(format!("no participant {}", args.actor)))?;
                let target_index = state
                    .participants
                    .iter()
                    .position(|participant| participant.id == target_id)
                    .ok_or_else(|| KernelError::NotFound(format!("no participant {target_id}")))?;
                let (lower, upper) = if actor_index < target_index {
                    (actor_index, target_index)
                } else {
                    (target_index, actor_index)
                };

                let outcome = {
                    let (left, right) = state.participants.split_at_mut(upper);
                    #[allow(clippy::indexing_slicing)]
                    let (attacker, target) = if actor_index < target_index {
                        (&mut left[lower], &mut right[0])
                    } else {
                        (&mut right[0], &mut left[lower])
                    };
                    resolve_attack(attacker, target, attack_bonus, target_ac, &damage_expr, damage_type, is_melee, &mut rng)?
                };

                if outcome.hit && outcome.damage_dealt > 0 {
                    let target_hp_after = state
                        .participants
                        .iter()
                        .find(|participant| participant.id == target_id)
                        .map_or(0, |participant| participant.hp);
                    apply_concentration_damage_check(
                        &mut state,
                        target_id,
                        target_hp_after,
                        outcome.damage_dealt.abs(),
                        &mut rng,
                    )?;
                }

                let text = format!(
                    "{} attacks {}: {:?}, {} damage dealt",
                    args.actor, target_id, outcome.degree, outcome.damage_dealt
                );
                (ToolResponse::with_state(text, &outcome)?, EventKind::AttackExecuted)
            }
            ActionKind::Heal => {
                let target_id = args.target.unwrap_or(args.actor);
                let heal_expr = args
                    .parameters
                    .heal_expr
                    .clone()
                    .ok_or_else(|| KernelError::Validation("heal requires healExpr".to_owned()))?;

                let actor_index = state
                    .participants
                    .iter()
                    .position(|participant| participant.id == args.actor)
                    .ok_or_else(|| KernelError::NotFound(format!("no participant {}", args.actor)))?;
                let target_index = state
                    .participants
                    .iter()
                    .position(|participant| participant.id == target_id)
                    .ok_or_else(|| KernelError::NotFound(format!("no participant {target_id}")))?;

                let (roll, healed) = if actor_index == target_index {
                    let participant = find_participant_mut(&mut state, args.actor)?;
                    if participant.action_used {
                        return Err(KernelError::from(CombatError::ActionEconomyExhausted {
                            slot: "action",
                            participant: participant.id,
                        }));
                    }
                    participant.action_used = true;
                    let trace = roll_expr(&mut rng, &heal_expr)?;
                    let healed = apply_healing(participant, trace.total);
                    (trace, healed)
                } else {
                    let (lower, upper) = if actor_index < target_index {
                        (actor_index, target_index)
                    } else {
                        (target_index, actor_index)
                    };
                    let (left, right) = state.participants.split_at_mut(upper);
                    #[allow(clippy::indexing_slicing)]
                    let (healer, target) = if actor_index < target_index {
                        (&mut left[lower], &mut right[0])
                    } else {
                        (&mut right[0], &mut left[lower])
                    };
                    resolve_heal(healer, target, &heal_expr, &mut rng)?
                };

                let text = format!("{} heals {}: {} hp restored", args.actor, target_id, healed);
                (ToolResponse::with_state(text, &roll)?, EventKind::HealExecuted)
            }
            ActionKind::Move => {
                let to = args
                    .parameters
                    .to
                    .ok_or_else(|| KernelError::Validation("move requires a destination".to_owned()))?;
                let mover_id = args.actor;
                let participant = find_participant_mut(&mut state, mover_id)?;
                let from = participant.position.unwrap_or(Position { x: 0, y: 0 });
                let movement_remaining = participant.movement_remaining;

                let obstacles = state.terrain.as_ref().map(|terrain| terrain.obstacles.clone()).unwrap_or_default();
                let difficult_terrain =
                    state.terrain.as_ref().map(|terrain| terrain.difficult_terrain.clone()).unwrap_or_default();
                let path = find_path(
                    from,
                    to,
                    |x, y| obstacles.contains(&(x, y)),
                    |x, y| if difficult_terrain.contains(&(x, y)) { 2 } else { 1 },
                )?;

                let step_tile_cost = |cell: Position| if difficult_terrain.contains(&(cell.x, cell.y)) { 2 } else { 1 };

                let mut total_tiles: u32 = 0;
                for step in path.windows(2) {
                    let [_, step_to] = step else { continue };
                    total_tiles = total_tiles.saturating_add(step_tile_cost(*step_to));
                }
                let total_feet = tiles_to_feet(total_tiles);
                if total_feet > movement_remaining {
                    return Err(KernelError::from(CombatError::InsufficientMovement {
                        participant: mover_id,
                        remaining: movement_remaining,
                        requested: total_feet,
                    }));
                }

                let mut opportunity_outcomes = Vec::new();
                let mut halted_at = from;
                let mut halted_early = false;
                let mut feet_consumed: u32 = 0;
                for step in path.windows(2) {
                    let [step_from, step_to] = step else { continue };
                    let (step_from, step_to) = (*step_from, *step_to);
                    let mover_died = resolve_opportunity_attacks_for_step(
                        &mut state,
                        mover_id,
                        step_from,
                        step_to,
                        defaults,
                        &mut rng,
                        &mut opportunity_outcomes,
                    )?;
                    if mover_died {
                        halted_early = true;
                        break;
                    }
                    reevaluate_auras_for_move(&mut state, mover_id, step_from, step_to, &mut rng)?;
                    feet_consumed = feet_consumed.saturating_add(tiles_to_feet(step_tile_cost(step_to)));
                    halted_at = step_to;
                }

                let participant = find_participant_mut(&mut state, mover_id)?;
                participant.movement_remaining = participant.movement_remaining.saturating_sub(feet_consumed);
                participant.position = Some(halted_at);

                let text = if halted_early {
                    format!("{mover_id} drops before reaching ({}, {}); halts at ({}, {})", to.x, to.y, halted_at.x, halted_at.y)
                } else {
                    format!("{mover_id} moves to ({}, {})", halted_at.x, halted_at.y)
                };
                let outcome = MoveOutcome { destination: halted_at, opportunity_attacks: opportunity_outcomes, halted_early };
                (ToolResponse::with_state(text, &outcome)?, EventKind::MoveExecuted)
            }
            ActionKind::Dash => {
                let participant = find_participant_mut(&mut state, args.actor)?;
                resolve_dash(participant)?;
                let text = format!("{} dashes, movement remaining {}", args.actor, participant.movement_remaining);
                (ToolResponse::with_state(text, &participant.movement_remaining)?, EventKind::MoveExecuted)
            }
            ActionKind::Disengage => {
                let participant = find_participant_mut(&mut state, args.actor)?;
                resolve_disengage(participant)?;
                let text = format!("{} disengages", args.actor);
                (ToolResponse::with_state(text, &true)?, EventKind::MoveExecuted)
            }
            ActionKind::OpportunityAttack => {
                return Err(KernelError::Validation(
                    "opportunityAttack is reaction-only and cannot be invoked directly".to_owned(),
                ));
            }
        };

        state.updated_at = Utc::now();
        ctx.put_encounter(state.clone());
        ctx.store().update_encounter(&state).await?;

        let event = Event {
            topic: Topic::Combat,
            kind: event_kind,
            payload: summary.state_json.clone().unwrap_or(serde_json::Value::Null),
            timestamp: Utc::now(),
        };
        ctx.store().append_event(&event).await?;
        ctx.events().publish(&event);

        Ok(summary)
    })
    .await
}

// ---------------------------------------------------------------------------
// combat.advanceTurn
// ---------------------------------------------------------------------------

/// Advance to the next participant's turn.
///
/// # Errors
/// Returns [`KernelError::State`] if the encounter has ended.
pub async fn combat_advance_turn(
    ctx: &KernelContext,
    encounter_id: EncounterId,
    seed: String,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::json!({ "encounterId": encounter_id, "seed": seed });
    ctx.record("combat_advance_turn", arguments, request_id, || async move {
        let mut state = ctx.get_encounter(encounter_id)?;
        let previous_index = state.current_turn_index;
        let mut rng = DeterministicRng::from_seed(&seed);
        let ticks = advance_turn(&mut state, &mut rng, Utc::now())?;

        ctx.put_encounter(state.clone());
        ctx.store().update_encounter(&state).await?;

        let event = Event {
            topic: Topic::Combat,
            kind: EventKind::TurnAdvanced,
            payload: serde_json::json!({ "encounterId": encounter_id, "round": state.round, "ticks": ticks }),
            timestamp: Utc::now(),
        };
        ctx.store().append_event(&event).await?;
        ctx.events().publish(&event);

        ToolResponse::with_state(
            format!("advanced from turn {previous_index} to turn {} (round {})", state.current_turn_index, state.round),
            &serde_json::json!({ "previousTurnIndex": previous_index, "currentTurnIndex": state.current_turn_index, "round": state.round, "ticks": ticks }),
        )
    })
    .await
}

// ---------------------------------------------------------------------------
// combat.endEncounter
// ---------------------------------------------------------------------------

/// End an encounter and sync participant hp back to their source characters.
///
/// # Errors
/// Returns [`KernelError::State`] if the encounter is already completed.
pub async fn combat_end_encounter(
    ctx: &KernelContext,
    encounter_id: EncounterId,
    request_id: Option<String>,
) -> Result<ToolResponse, KernelError> {
    let arguments = serde_json::json!({ "encounterId": encounter_id });
    ctx.record("combat_end_encounter", arguments, request_id, || async move {
        let mut state = ctx.get_encounter(encounter_id)?;
        let final_hp = end_encounter(&mut state, Utc::now())?;

        for participant in &state.participants {
            if let Some(character_id) = participant.source_character_id {
                let mut character = ctx.store().get_character(character_id).await?;
                character.hp = participant.hp;
                ctx.store().update_character(&character).await?;
            }
        }

        ctx.put_encounter(state.clone());
        ctx.store().update_encounter(&state).await?;
        ctx.remove_encounter(encounter_id);

        let event = Event {
            topic: Topic::Combat,
            kind: EventKind::EncounterEnded,
            payload: serde_json::json!({ "encounterId": encounter_id, "finalHp": final_hp }),
            timestamp: Utc::now(),
        };
        ctx.store().append_event(&event).await?;
        ctx.events().publish(&event);

        ToolResponse::with_state(format!("encounter {encounter_id} ended, {} participants synced", final_hp.len()), &final_hp)
    })
    .await
}

// ---------------------------------------------------------------------------
// events.subscribe
// ---------------------------------------------------------------------------

/// Register an acknowledgment subscriber on each of `topics`, so
/// `events().subscriber_count` reflects that a listener is attached; actual
/// delivery is via whatever transport wraps this tool surface.
pub fn events_subscribe(ctx: &KernelContext, topics: Vec<Topic>) -> ToolResponse {
    for topic in topics {
        ctx.events().subscribe(topic, Box::new(|_event| Ok(())));
    }
    ToolResponse { text: "subscribed".to_owned(), state_json: None }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::context::Store;
    use rpgkernel_events::SimClock;
    use rpgkernel_world::WorldGenConfig;

    fn test_ctx() -> KernelContext {
        KernelContext::new("test-session", Store::in_memory(), SimClock::new(Utc::now()))
    }

    fn participant(name: &str, is_enemy: bool) -> ParticipantInput {
        ParticipantInput {
            name: name.to_owned(),
            hp: 20,
            max_hp: 20,
            initiative_bonus: 0,
            is_enemy,
            movement_speed: None,
            position: Some(Position { x: 0, y: 0 }),
            source_character_id: None,
        }
    }

    async fn generate_test_world(ctx: &KernelContext) -> WorldId {
        let args = WorldGenerateArgs {
            name: "Test World".to_owned(),
            seed: "kernel-test".to_owned(),
            width: 8,
            height: 8,
            land_ratio: None,
            octaves: None,
        };
        let response = world_generate(ctx, args, &WorldGenConfig::default(), None).await.expect("generation ok");
        let state = response.state_json.expect("state present");
        serde_json::from_value::<WorldId>(state["world"]["id"].clone()).expect("worldId decodes")
    }

    #[tokio::test]
    async fn world_generate_then_get_state_round_trips() {
        let ctx = test_ctx();
        let world_id = generate_test_world(&ctx).await;

        let response = world_get_state(&ctx, world_id, None).await.expect("fetch ok");
        let state = response.state_json.expect("state present");
        assert_eq!(state["world_id"], serde_json::json!(world_id));
        assert_eq!(state["width"], serde_json::json!(8));
    }

    #[tokio::test]
    async fn world_get_state_rejects_unknown_world() {
        let ctx = test_ctx();
        let result = world_get_state(&ctx, WorldId::new(), None).await;
        assert!(matches!(result, Err(KernelError::NotFound(_))));
    }

    #[tokio::test]
    async fn map_patch_preview_does_not_mutate_world() {
        let ctx = test_ctx();
        let world_id = generate_test_world(&ctx).await;
        let tiles_before = ctx.store().list_tiles(world_id).await.expect("list ok");
        let script = "SET_BIOME x=0 y=0 biome=desert".to_owned();

        let response = map_patch_preview(&ctx, world_id, script, None).await.expect("preview ok");
        let will_modify = response.state_json.expect("state present")["willModify"]
            .as_bool()
            .expect("willModify is a bool");
        assert!(will_modify);

        let tiles_after = ctx.store().list_tiles(world_id).await.expect("list ok");
        assert_eq!(tiles_before, tiles_after);
    }

    #[tokio::test]
    async fn map_patch_apply_persists_the_change_preview_reported() {
        let ctx = test_ctx();
        let world_id = generate_test_world(&ctx).await;
        let script = "SET_BIOME x=0 y=0 biome=desert".to_owned();

        let response = map_patch_apply(&ctx, world_id, script, None).await.expect("apply ok");
        let diff = response.state_json.expect("diff present");
        assert_eq!(diff["tiles_changed"], serde_json::json!(1));

        let tiles_after = ctx.store().list_tiles(world_id).await.expect("list ok");
        let origin = tiles_after.iter().find(|tile| tile.x == 0 && tile.y == 0).expect("origin tile exists");
        assert_eq!(origin.biome, rpgkernel_types::Biome::Desert);
    }

    #[tokio::test]
    async fn map_patch_apply_rejects_an_unknown_command() {
        let ctx = test_ctx();
        let world_id = generate_test_world(&ctx).await;
        let script = "FLY_TO_THE_MOON x=0 y=0".to_owned();

        let result = map_patch_apply(&ctx, world_id, script, None).await;
        assert!(matches!(result, Err(KernelError::Validation(_))));
    }

    async fn start_two_party_encounter(ctx: &KernelContext) -> (EncounterId, ParticipantId, ParticipantId) {
        let args = CreateEncounterArgs {
            seed: "encounter-seed".to_owned(),
            participants: vec![participant("Hero", false), participant("Goblin", true)],
            terrain: None,
            world_id: None,
        };
        let response = combat_create_encounter(ctx, args, 30, None).await.expect("create ok");
        let state_json = response.state_json.expect("state present");
        let state: CombatState = serde_json::from_value(state_json).expect("state decodes");
        let encounter_id = state.id;
        let first = *state.turn_order.first().expect("at least one participant");
        let second = *state.turn_order.get(1).expect("at least two participants");
        (encounter_id, first, second)
    }

    #[tokio::test]
    async fn create_encounter_seats_every_participant_and_rejects_empty() {
        let ctx = test_ctx();
        let (encounter_id, _, _) = start_two_party_encounter(&ctx).await;

        let response = combat_get_encounter_state(&ctx, encounter_id, None).await.expect("fetch ok");
        let state: CombatState = serde_json::from_value(response.state_json.expect("state present")).expect("decodes");
        assert_eq!(state.participants.len(), 2);
        assert_eq!(state.status, EncounterStatus::Active);

        let empty = CreateEncounterArgs {
            seed: "empty".to_owned(),
            participants: Vec::new(),
            terrain: None,
            world_id: None,
        };
        let result = combat_create_encounter(&ctx, empty, 30, None).await;
        assert!(matches!(result, Err(KernelError::Validation(_))));
    }

    #[tokio::test]
    async fn move_action_consumes_movement_and_updates_position() {
        let ctx = test_ctx();
        let (encounter_id, actor, _) = start_two_party_encounter(&ctx).await;

        let args = ExecuteActionArgs {
            encounter_id,
            action: ActionKind::Move,
            actor,
            target: None,
            parameters: ActionParameters {
                attack_bonus: None,
                target_ac: None,
                damage_expr: None,
                damage_type: None,
                is_melee: None,
                heal_expr: None,
                to: Some(Position { x: 3, y: 0 }),
            },
            seed: "move-seed".to_owned(),
        };
        combat_execute_action(&ctx, args, &CombatDefaults::default(), None).await.expect("move ok");

        let state = ctx.get_encounter(encounter_id).expect("encounter live");
        let moved = state.participants.iter().find(|p| p.id == actor).expect("actor present");
        assert_eq!(moved.position, Some(Position { x: 3, y: 0 }));
        assert_eq!(moved.movement_remaining, 15);
    }

    #[tokio::test]
    async fn dash_action_is_rejected_for_an_actor_who_is_not_seated_yet() {
        let ctx = test_ctx();
        let (encounter_id, _, _) = start_two_party_encounter(&ctx).await;

        let args = ExecuteActionArgs {
            encounter_id,
            action: ActionKind::Dash,
            actor: ParticipantId::new(),
            target: None,
            parameters: ActionParameters {
                attack_bonus: None,
                target_ac: None,
                damage_expr: None,
                damage_type: None,
                is_melee: None,
                heal_expr: None,
                to: None,
            },
            seed: "dash-seed".to_owned(),
        };
        let result = combat_execute_action(&ctx, args, &CombatDefaults::default(), None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn self_heal_restores_hp_and_consumes_the_action_slot() {
        let ctx = test_ctx();
        let (encounter_id, actor, _) = start_two_party_encounter(&ctx).await;

        {
            let mut state = ctx.get_encounter(encounter_id).expect("encounter live");
            for participant in &mut state.participants {
                if participant.id == actor {
                    participant.hp = 5;
                }
            }
            ctx.put_encounter(state);
        }

        let args = ExecuteActionArgs {
            encounter_id,
            action: ActionKind::Heal,
            actor,
            target: None,
            parameters: ActionParameters {
                attack_bonus: None,
                target_ac: None,
                damage_expr: None,
                damage_type: None,
                is_melee: None,
                heal_expr: Some("2d4+2".to_owned()),
                to: None,
            },
            seed: "heal-seed".to_owned(),
        };
        combat_execute_action(&ctx, args, &CombatDefaults::default(), None).await.expect("heal ok");

        let state = ctx.get_encounter(encounter_id).expect("encounter live");
        let healed = state.participants.iter().find(|p| p.id == actor).expect("actor present");
        assert!(healed.hp > 5);
        assert!(healed.action_used);
    }

    #[tokio::test]
    async fn opportunity_attack_cannot_be_invoked_directly() {
        let ctx = test_ctx();
        let (encounter_id, actor, target) = start_two_party_encounter(&ctx).await;

        let args = ExecuteActionArgs {
            encounter_id,
            action: ActionKind::OpportunityAttack,
            actor,
            target: Some(target),
            parameters: ActionParameters {
                attack_bonus: Some(5),
                target_ac: Some(12),
                damage_expr: Some("1d6".to_owned()),
                damage_type: Some(DamageType::Slashing),
                is_melee: Some(true),
                heal_expr: None,
                to: None,
            },
            seed: "oa-seed".to_owned(),
        };
        let result = combat_execute_action(&ctx, args, &CombatDefaults::default(), None).await;
        assert!(matches!(result, Err(KernelError::Validation(_))));
    }

    #[tokio::test]
    async fn advance_turn_moves_to_the_second_participant() {
        let ctx = test_ctx();
        let (encounter_id, _, _) = start_two_party_encounter(&ctx).await;

        let response = combat_advance_turn(&ctx, encounter_id, "advance-seed".to_owned(), None)
            .await
            .expect("advance ok");
        let state = response.state_json.expect("state present");
        assert_eq!(state["currentTurnIndex"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn end_encounter_removes_it_from_the_live_registry() {
        let ctx = test_ctx();
        let (encounter_id, _, _) = start_two_party_encounter(&ctx).await;

        combat_end_encounter(&ctx, encounter_id, None).await.expect("end ok");
        assert!(ctx.get_encounter(encounter_id).is_err());
    }

    #[test]
    fn events_subscribe_registers_a_listener_per_topic() {
        let ctx = test_ctx();
        assert_eq!(ctx.events().subscriber_count(Topic::Combat), 0);
        events_subscribe(&ctx, vec![Topic::Combat, Topic::World]);
        assert_eq!(ctx.events().subscriber_count(Topic::Combat), 1);
        assert_eq!(ctx.events().subscriber_count(Topic::World), 1);
    }
}
