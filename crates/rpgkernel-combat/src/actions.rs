//! Attack, heal, move, dash, and disengage action resolution.
#![allow(clippy::indexing_slicing)]

use rpgkernel_dice::{check_degree, d20, roll_expr, roll_with_advantage, roll_with_disadvantage, DeterministicRng};
use rpgkernel_types::{CheckDegree, DamageType, Participant, ParticipantId, Position, RollTrace};
use rpgkernel_spatial::chebyshev_distance;
use serde::{Deserialize, Serialize};

use crate::advantage::attack_roll_state;
use crate::damage::{apply_damage, apply_healing};
use crate::economy::is_incapacitated;
use crate::error::CombatError;

/// The fully-resolved outcome of an attack action, audit- and replay-ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// The attacking participant.
    pub attacker_id: ParticipantId,
    /// The targeted participant.
    pub target_id: ParticipantId,
    /// Unmodified d20 result actually used (post advantage/disadvantage resolution).
    pub attack_natural: i32,
    /// `attack_natural + attack_bonus`.
    pub attack_total: i32,
    /// Degree of success against the target's AC.
    pub degree: CheckDegree,
    /// Whether the attack hit.
    pub hit: bool,
    /// The damage roll, if the attack hit.
    pub damage_roll: Option<RollTrace>,
    /// Actual hit-point delta applied to the target (post resistance/vulnerability/immunity).
    pub damage_dealt: i32,
}

fn roll_attack_d20(rng: &mut DeterministicRng, advantage: bool, disadvantage: bool) -> i32 {
    match (advantage, disadvantage) {
        (true, false) => roll_with_advantage(rng),
        (false, true) => roll_with_disadvantage(rng),
        _ => d20(rng),
    }
}

/// Resolve an attack action: consumes the attacker's action slot, rolls to
/// hit with advantage/disadvantage from active conditions, and applies
/// damage (doubling dice, not modifier, on a critical hit) on success.
///
/// # Errors
/// Returns [`CombatError::ActionEconomyExhausted`] if the attacker's action
/// is already spent, [`CombatError::Incapacitated`] if they cannot act, or
/// [`CombatError::Dice`] if `damage_expr` is malformed.
pub fn resolve_attack(
    attacker: &mut Participant,
    target: &mut Participant,
    attack_bonus: i32,
    target_ac: i32,
    damage_expr: &str,
    damage_type: DamageType,
    is_melee: bool,
    rng: &mut DeterministicRng,
) -> Result<AttackOutcome, CombatError> {
    if is_incapacitated(attacker) {
        return Err(CombatError::Incapacitated(attacker.id));
    }
    if attacker.action_used {
        return Err(CombatError::ActionEconomyExhausted {
            slot: "action",
            participant: attacker.id,
        });
    }

    let (advantage, disadvantage) = attack_roll_state(attacker, target, is_melee);
    let natural = roll_attack_d20(rng, advantage, disadvantage);
    let total = natural.saturating_add(attack_bonus);
    let degree = check_degree(natural, total, target_ac);
    let hit = matches!(degree, CheckDegree::Success | CheckDegree::CriticalSuccess);

    attacker.action_used = true;

    let (damage_roll, damage_dealt) = if hit {
        let mut trace = roll_expr(rng, damage_expr)?;
        if degree == CheckDegree::CriticalSuccess {
            let bonus = roll_expr(rng, &dice_only(damage_expr))?;
            trace.dice.extend(bonus.dice.iter().copied());
            trace.total = trace.total.saturating_add(bonus.dice.iter().sum::<i32>());
        }
        let dealt = apply_damage(target, damage_type, trace.total);
        (Some(trace), dealt)
    } else {
        (None, 0)
    };

    Ok(AttackOutcome {
        attacker_id: attacker.id,
        target_id: target.id,
        attack_natural: natural,
        attack_total: total,
        degree,
        hit,
        damage_roll,
        damage_dealt,
    })
}

/// Strip a trailing `+K`/`-K` modifier from a dice expression, leaving just
/// the `NdM` portion, for doubling dice (not modifier) on a critical hit.
fn dice_only(expr: &str) -> String {
    let trimmed = expr.trim();
    let plus = trimmed.find('+');
    let minus = trimmed.rfind('-');
    match (plus, minus) {
        (Some(i), _) => trimmed[..i].to_owned(),
        (None, Some(i)) if i > 0 => trimmed[..i].to_owned(),
        _ => trimmed.to_owned(),
    }
}

/// Resolve a heal action: consumes the healer's action slot and restores
/// hit points to `target`, clamped to their max.
///
/// # Errors
/// Returns [`CombatError::ActionEconomyExhausted`] if the action is already
/// spent, or [`CombatError::Dice`] if `heal_expr` is malformed.
pub fn resolve_heal(
    healer: &mut Participant,
    target: &mut Participant,
    heal_expr: &str,
    rng: &mut DeterministicRng,
) -> Result<(RollTrace, i32), CombatError> {
    if healer.action_used {
        return Err(CombatError::ActionEconomyExhausted {
            slot: "action",
            participant: healer.id,
        });
    }
    healer.action_used = true;
    let trace = roll_expr(rng, heal_expr)?;
    let healed = apply_healing(target, trace.total);
    Ok((trace, healed))
}

/// Resolve a move action: consumes movement in feet, failing if the
/// participant lacks enough remaining movement for the requested distance
/// (Chebyshev distance between `from` and `to`, in tiles, converted to feet).
///
/// # Errors
/// Returns [`CombatError::InsufficientMovement`] if the requested distance
/// exceeds remaining movement.
pub fn resolve_move(participant: &mut Participant, from: Position, to: Position) -> Result<(), CombatError> {
    let tiles = chebyshev_distance((from.x, from.y), (to.x, to.y));
    let requested = rpgkernel_spatial::tiles_to_feet(tiles);
    if requested > participant.movement_remaining {
        return Err(CombatError::InsufficientMovement {
            participant: participant.id,
            remaining: participant.movement_remaining,
            requested,
        });
    }
    participant.movement_remaining = participant.movement_remaining.saturating_sub(requested);
    participant.position = Some(to);
    Ok(())
}

/// Resolve a dash action: consumes the action slot and doubles remaining
/// movement for the turn.
///
/// # Errors
/// Returns [`CombatError::ActionEconomyExhausted`] if the action is already spent.
pub fn resolve_dash(participant: &mut Participant) -> Result<(), CombatError> {
    if participant.action_used {
        return Err(CombatError::ActionEconomyExhausted {
            slot: "action",
            participant: participant.id,
        });
    }
    participant.action_used = true;
    participant.has_dashed = true;
    participant.movement_remaining = participant.movement_remaining.saturating_add(participant.movement_speed);
    Ok(())
}

/// Resolve a disengage action: consumes the action slot; the participant
/// no longer provokes opportunity attacks for the rest of the turn.
///
/// # Errors
/// Returns [`CombatError::ActionEconomyExhausted`] if the action is already spent.
pub fn resolve_disengage(participant: &mut Participant) -> Result<(), CombatError> {
    if participant.action_used {
        return Err(CombatError::ActionEconomyExhausted {
            slot: "action",
            participant: participant.id,
        });
    }
    participant.action_used = true;
    participant.has_disengaged = true;
    Ok(())
}

/// Whether `mover` leaving `from` for `to` provokes an opportunity attack
/// from `watcher`: `watcher` is hostile to `mover`, `mover` has not
/// disengaged, and `to` leaves `watcher`'s reach (5 feet) while `from` was
/// within it.
#[must_use]
pub fn provokes_opportunity_attack(
    mover: &Participant,
    watcher: &Participant,
    watcher_position: Position,
    from: Position,
    to: Position,
) -> bool {
    if mover.has_disengaged || is_incapacitated(watcher) {
        return false;
    }
    let reach = 1; // 5 feet, one tile
    let was_in_reach = chebyshev_distance((watcher_position.x, watcher_position.y), (from.x, from.y)) <= reach;
    let leaves_reach = chebyshev_distance((watcher_position.x, watcher_position.y), (to.x, to.y)) > reach;
    was_in_reach && leaves_reach
}

/// Resolve an opportunity attack: consumes the reaction slot instead of the action slot.
///
/// # Errors
/// Returns [`CombatError::ActionEconomyExhausted`] if the reaction is already spent.
pub fn resolve_opportunity_attack(
    attacker: &mut Participant,
    target: &mut Participant,
    attack_bonus: i32,
    target_ac: i32,
    damage_expr: &str,
    damage_type: DamageType,
    rng: &mut DeterministicRng,
) -> Result<AttackOutcome, CombatError> {
    if attacker.reaction_used {
        return Err(CombatError::ActionEconomyExhausted {
            slot: "reaction",
            participant: attacker.id,
        });
    }
    attacker.reaction_used = true;
    // Borrow attacker.action_used temporarily so resolve_attack's action-slot
    // check passes; opportunity attacks consume the reaction, not the action.
    let action_was_used = attacker.action_used;
    attacker.action_used = false;
    let result = resolve_attack(attacker, target, attack_bonus, target_ac, damage_expr, damage_type, true, rng);
    attacker.action_used = action_was_used;
    result
}
