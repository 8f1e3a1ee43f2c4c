//! Advantage/disadvantage resolution from active conditions, per `spec.md` §4.D.5.

use rpgkernel_types::{ConditionType, Participant};

fn has(participant: &Participant, condition_type: ConditionType) -> bool {
    participant.conditions.iter().any(|c| c.condition_type == condition_type)
}

/// Whether an attack roll from `attacker` against `target` has advantage,
/// disadvantage, both (which cancel to neither), or neither.
#[must_use]
pub fn attack_roll_state(attacker: &Participant, target: &Participant, is_melee: bool) -> (bool, bool) {
    let mut advantage = false;
    let mut disadvantage = false;

    // Target-side conditions.
    if has(target, ConditionType::Prone) {
        if is_melee {
            advantage = true;
        } else {
            disadvantage = true;
        }
    }
    if has(target, ConditionType::Restrained)
        || has(target, ConditionType::Stunned)
        || has(target, ConditionType::Paralyzed)
        || has(target, ConditionType::Unconscious)
        || has(target, ConditionType::Petrified)
        || has(target, ConditionType::Blinded)
    {
        advantage = true;
    }
    if has(target, ConditionType::Invisible) {
        disadvantage = true;
    }

    // Attacker-side conditions.
    if has(attacker, ConditionType::Prone)
        || has(attacker, ConditionType::Restrained)
        || has(attacker, ConditionType::Blinded)
        || has(attacker, ConditionType::Poisoned)
        || has(attacker, ConditionType::Frightened)
    {
        disadvantage = true;
    }
    if has(attacker, ConditionType::Invisible) {
        advantage = true;
    }

    (advantage, disadvantage)
}

/// Whether an ability check from `participant` has disadvantage from their
/// active conditions (Poisoned/Frightened).
#[must_use]
pub fn check_has_disadvantage(participant: &Participant) -> bool {
    has(participant, ConditionType::Poisoned) || has(participant, ConditionType::Frightened)
}
