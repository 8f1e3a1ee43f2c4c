//! Condition application, removal, and per-turn duration processing.
#![allow(clippy::arithmetic_side_effects)]

use rpgkernel_dice::{check_degree, d20, roll_expr, DeterministicRng};
use rpgkernel_types::{CheckDegree, Condition, ConditionId, DamageType, DurationType, Participant};
use serde::{Deserialize, Serialize};

use crate::damage::apply_damage_modifiers;
use crate::error::CombatError;

/// A single ongoing-effect tick, ready to apply to hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTick {
    /// The condition that produced this tick.
    pub condition_id: ConditionId,
    /// Negative for damage, positive for healing.
    pub hp_delta: i32,
}

/// Add a condition to a participant.
pub fn apply_condition(participant: &mut Participant, condition: Condition) {
    participant.conditions.push(condition);
}

/// Remove a condition by id. Returns `true` if a condition was removed.
pub fn remove_condition(participant: &mut Participant, condition_id: ConditionId) -> bool {
    let before = participant.conditions.len();
    participant.conditions.retain(|c| c.id != condition_id);
    participant.conditions.len() != before
}

fn resolve_amount(
    amount: Option<i32>,
    dice: Option<&str>,
    rng: &mut DeterministicRng,
) -> Result<i32, CombatError> {
    if let Some(expr) = dice {
        Ok(roll_expr(rng, expr)?.total)
    } else {
        Ok(amount.unwrap_or(0))
    }
}

/// Process every condition's effects and duration bookkeeping for one
/// trigger point (`StartOfTurn` or `EndOfTurn`), applying damage/healing
/// directly to `participant.hp` and removing conditions whose duration has
/// lapsed. Returns the ticks applied, for audit/event logging.
///
/// # Errors
/// Returns [`CombatError::Dice`] if an ongoing effect's dice expression is malformed.
pub fn process_duration_trigger(
    participant: &mut Participant,
    trigger: DurationType,
    rng: &mut DeterministicRng,
) -> Result<Vec<EffectTick>, CombatError> {
    let mut ticks = Vec::new();
    let conditions = std::mem::take(&mut participant.conditions);
    let mut retained = Vec::new();

    for mut condition in conditions {
        for effect in &condition.ongoing_effects {
            if effect.trigger == trigger {
                let amount = resolve_amount(effect.amount, effect.dice.as_deref(), rng)?;
                let delta = if effect.is_damage { -amount } else { amount };
                ticks.push(EffectTick {
                    condition_id: condition.id,
                    hp_delta: delta,
                });
            }
        }

        let expired = matches!(
            (condition.duration_type, trigger),
            (DurationType::StartOfTurn, DurationType::StartOfTurn)
                | (DurationType::EndOfTurn, DurationType::EndOfTurn)
        ) || (condition.duration_type == DurationType::Rounds
            && trigger == DurationType::StartOfTurn
            && decrement_rounds(&mut condition));

        if !expired {
            retained.push(condition);
        }
    }

    participant.conditions = retained;

    for tick in &ticks {
        if tick.hp_delta < 0 {
            let raw = tick.hp_delta.unsigned_abs();
            let modified = apply_damage_modifiers(participant, DamageType::Poison, raw.try_into().unwrap_or(i32::MAX));
            participant.hp = participant.hp.saturating_sub(modified).max(0);
        } else {
            participant.hp = participant.hp.saturating_add(tick.hp_delta).min(participant.max_hp);
        }
    }

    Ok(ticks)
}

fn decrement_rounds(condition: &mut Condition) -> bool {
    let remaining = condition.duration.unwrap_or(0).saturating_sub(1);
    condition.duration = Some(remaining);
    remaining == 0
}

/// Process all end-of-turn bookkeeping for the outgoing participant: fire
/// `EndOfTurn` ongoing effects (and expire `EndOfTurn`-duration conditions),
/// then roll each `SaveEnds` condition's saving throw, removing it on
/// success, per `spec.md` §4.D.5.
///
/// # Errors
/// Returns [`CombatError::Dice`] if an ongoing effect's dice expression is malformed.
pub fn process_end_of_turn(
    participant: &mut Participant,
    rng: &mut DeterministicRng,
) -> Result<Vec<EffectTick>, CombatError> {
    let ticks = process_duration_trigger(participant, DurationType::EndOfTurn, rng)?;

    let save_ends: Vec<ConditionId> = participant
        .conditions
        .iter()
        .filter(|c| c.duration_type == DurationType::SaveEnds)
        .map(|c| c.id)
        .collect();
    for condition_id in save_ends {
        // Participants don't carry ability scores in this model; saves roll
        // a flat d20 against the condition's DC.
        try_end_save(participant, condition_id, 0, rng)?;
    }

    Ok(ticks)
}

/// Roll a `SaveEnds` condition's saving throw at end of turn; on success
/// (per [`check_degree`] classifying as `Success` or `CriticalSuccess`) the
/// condition is removed.
///
/// # Errors
/// Returns [`CombatError::ParticipantNotFound`]-free; this function cannot
/// fail on bad input, but returns a [`CombatError::Dice`] if dice resolution
/// ever becomes fallible in a future ongoing-effect extension.
pub fn try_end_save(
    participant: &mut Participant,
    condition_id: ConditionId,
    ability_modifier: i32,
    rng: &mut DeterministicRng,
) -> Result<bool, CombatError> {
    let Some(condition) = participant.conditions.iter().find(|c| c.id == condition_id) else {
        return Ok(false);
    };
    let Some(dc) = condition.save_dc else {
        return Ok(false);
    };

    let natural = d20(rng);
    let total = natural.saturating_add(ability_modifier);
    let degree = check_degree(natural, total, dc);
    let succeeded = matches!(degree, CheckDegree::Success | CheckDegree::CriticalSuccess);

    if succeeded {
        remove_condition(participant, condition_id);
    }

    Ok(succeeded)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rpgkernel_types::{OngoingEffect, ParticipantId};

    fn make_participant() -> Participant {
        Participant {
            id: ParticipantId::new(),
            source_character_id: None,
            name: "Test".to_owned(),
            initiative_bonus: 0,
            initiative: 0,
            is_enemy: false,
            hp: 20,
            max_hp: 20,
            conditions: Vec::new(),
            position: None,
            movement_speed: 30,
            movement_remaining: 30,
            action_used: false,
            bonus_action_used: false,
            reaction_used: false,
            has_dashed: false,
            has_disengaged: false,
            free_interaction_used: false,
            resistances: Default::default(),
            vulnerabilities: Default::default(),
            immunities: Default::default(),
        }
    }

    #[test]
    fn start_of_turn_condition_expires_after_firing() {
        let mut participant = make_participant();
        apply_condition(
            &mut participant,
            Condition {
                id: ConditionId::new(),
                condition_type: rpgkernel_types::ConditionType::Poisoned,
                duration_type: DurationType::StartOfTurn,
                duration: None,
                save_dc: None,
                save_ability: None,
                ongoing_effects: vec![OngoingEffect {
                    trigger: DurationType::StartOfTurn,
                    is_damage: true,
                    amount: Some(3),
                    dice: None,
                }],
            },
        );
        let mut rng = DeterministicRng::from_seed("cond-test");
        let ticks = process_duration_trigger(&mut participant, DurationType::StartOfTurn, &mut rng)
            .expect("no dice error");
        assert_eq!(ticks.len(), 1);
        assert_eq!(participant.hp, 17);
        assert!(participant.conditions.is_empty());
    }

    #[test]
    fn rounds_condition_decrements_and_expires_at_zero() {
        let mut participant = make_participant();
        apply_condition(
            &mut participant,
            Condition {
                id: ConditionId::new(),
                condition_type: rpgkernel_types::ConditionType::Frightened,
                duration_type: DurationType::Rounds,
                duration: Some(1),
                save_dc: None,
                save_ability: None,
                ongoing_effects: Vec::new(),
            },
        );
        let mut rng = DeterministicRng::from_seed("cond-test-2");
        process_duration_trigger(&mut participant, DurationType::StartOfTurn, &mut rng).expect("ok");
        assert!(participant.conditions.is_empty());
    }

    #[test]
    fn permanent_condition_never_expires_via_ticking() {
        let mut participant = make_participant();
        apply_condition(
            &mut participant,
            Condition {
                id: ConditionId::new(),
                condition_type: rpgkernel_types::ConditionType::Blinded,
                duration_type: DurationType::Permanent,
                duration: None,
                save_dc: None,
                save_ability: None,
                ongoing_effects: Vec::new(),
            },
        );
        let mut rng = DeterministicRng::from_seed("cond-test-3");
        process_duration_trigger(&mut participant, DurationType::StartOfTurn, &mut rng).expect("ok");
        process_duration_trigger(&mut participant, DurationType::EndOfTurn, &mut rng).expect("ok");
        assert_eq!(participant.conditions.len(), 1);
    }

    #[test]
    fn save_ends_removes_condition_on_success() {
        let mut participant = make_participant();
        let condition_id = ConditionId::new();
        apply_condition(
            &mut participant,
            Condition {
                id: condition_id,
                condition_type: rpgkernel_types::ConditionType::Restrained,
                duration_type: DurationType::SaveEnds,
                duration: None,
                save_dc: Some(1),
                save_ability: None,
                ongoing_effects: Vec::new(),
            },
        );
        let mut rng = DeterministicRng::from_seed("save-test");
        let succeeded = try_end_save(&mut participant, condition_id, 20, &mut rng).expect("ok");
        assert!(succeeded);
        assert!(participant.conditions.is_empty());
    }
}
