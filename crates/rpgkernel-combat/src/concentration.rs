//! Concentration tracking: one spell per caster, broken by failed Con saves.

use rpgkernel_dice::{check_degree, d20, DeterministicRng};
use rpgkernel_types::{AuraId, CheckDegree, CombatState, Concentration, ParticipantId};

use crate::damage::concentration_dc;
use crate::error::CombatError;

/// Begin concentrating on a spell, returning the new slot. Callers are
/// responsible for breaking any prior concentration for this participant
/// first (at most one per participant, per `spec.md` §4.D.7).
#[must_use]
pub fn begin_concentration(participant_id: ParticipantId, spell_name: &str) -> Concentration {
    Concentration {
        participant_id,
        spell_name: spell_name.to_owned(),
        aura_ids: Vec::new(),
    }
}

/// Attach an aura to an active concentration slot, so it is torn down
/// together when concentration breaks.
pub fn attach_aura(concentration: &mut Concentration, aura_id: AuraId) {
    concentration.aura_ids.push(aura_id);
}

/// Roll a concentration save after taking damage: a Constitution save
/// against `max(10, floor(damage_taken / 2))`. Returns whether
/// concentration survives.
///
/// # Errors
/// This function cannot currently fail; it returns a `Result` because dice
/// resolution is itself fallible in the crate's convention and call sites
/// already propagate with `?`.
pub fn check_concentration(
    con_save_modifier: i32,
    damage_taken: i32,
    rng: &mut DeterministicRng,
) -> Result<bool, CombatError> {
    let dc = concentration_dc(damage_taken);
    let natural = d20(rng);
    let total = natural.saturating_add(con_save_modifier);
    let degree = check_degree(natural, total, dc);
    Ok(matches!(degree, CheckDegree::Success | CheckDegree::CriticalSuccess))
}

/// Check whether damage just taken breaks `target_id`'s active concentration
/// (if any), rolling the save from [`check_concentration`], and tearing down
/// the concentration's auras on failure. Hitting 0 hp ends concentration
/// outright, with no save. A no-op if `target_id` isn't concentrating or
/// took no damage. Per `spec.md` §4.D.6.
///
/// # Errors
/// Returns [`CombatError::Dice`] if roll resolution fails.
pub fn apply_concentration_damage_check(
    state: &mut CombatState,
    target_id: ParticipantId,
    target_hp_after: i32,
    damage_taken: i32,
    rng: &mut DeterministicRng,
) -> Result<(), CombatError> {
    if damage_taken <= 0 {
        return Ok(());
    }
    let Some(index) = state.concentrations.iter().position(|c| c.participant_id == target_id) else {
        return Ok(());
    };

    // Participants don't carry ability scores in this model; concentration
    // saves roll a flat d20 against the damage-derived DC.
    let survived = if target_hp_after <= 0 { false } else { check_concentration(0, damage_taken, rng)? };

    if !survived {
        let concentration = state.concentrations.remove(index);
        state.auras.retain(|aura| !concentration.aura_ids.contains(&aura.id));
    }
    Ok(())
}
