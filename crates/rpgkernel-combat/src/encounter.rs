//! Encounter lifecycle: creation, turn advancement, and completion.

use chrono::{DateTime, Utc};
use rpgkernel_dice::DeterministicRng;
use rpgkernel_types::{
    AuraTrigger, CombatState, DurationType, EncounterId, EncounterStatus, Participant, Terrain, WorldId,
};

use crate::auras::{reevaluate_auras, AuraTick};
use crate::conditions::{process_duration_trigger, process_end_of_turn, EffectTick};
use crate::economy::start_turn;
use crate::error::CombatError;
use crate::initiative::roll_initiative;

/// Everything that happened while advancing a turn: ongoing-condition ticks
/// and aura-effect ticks, from both the outgoing participant's end-of-turn
/// processing and the incoming participant's start-of-turn processing.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TurnTicks {
    /// Ticks from condition duration processing (`EndOfTurn`/`StartOfTurn`/`SaveEnds`).
    pub condition_ticks: Vec<EffectTick>,
    /// Ticks from aura reevaluation (`EndOfTurn`/`StartOfTurn`).
    pub aura_ticks: Vec<AuraTick>,
}

/// Create an encounter: rolls initiative for every participant and seats
/// the first turn, per `spec.md` §4.D.1.
#[must_use]
pub fn create_encounter(
    id: EncounterId,
    world_id: Option<WorldId>,
    mut participants: Vec<Participant>,
    terrain: Option<Terrain>,
    rng: &mut DeterministicRng,
    now: DateTime<Utc>,
) -> CombatState {
    let turn_order = roll_initiative(&mut participants, rng);
    for participant in &mut participants {
        start_turn(participant);
    }

    CombatState {
        id,
        world_id,
        participants,
        turn_order,
        current_turn_index: 0,
        round: 1,
        terrain,
        created_at: now,
        updated_at: now,
        status: EncounterStatus::Active,
        concentrations: Vec::new(),
        auras: Vec::new(),
    }
}

/// Advance to the next participant's turn, wrapping to a new round when the
/// turn order cycles back to its start. Processes the outgoing participant's
/// `EndOfTurn` condition triggers and `SaveEnds` rolls, then resets the new
/// current participant's action economy and fires their `StartOfTurn`
/// condition triggers.
///
/// # Errors
/// Returns [`CombatError::EncounterNotActive`] if the encounter has ended,
/// or [`CombatError::ParticipantNotFound`] if `turn_order` references a
/// participant no longer present.
pub fn advance_turn(
    state: &mut CombatState,
    rng: &mut DeterministicRng,
    now: DateTime<Utc>,
) -> Result<TurnTicks, CombatError> {
    if state.status != EncounterStatus::Active {
        return Err(CombatError::EncounterNotActive);
    }
    if state.turn_order.is_empty() {
        return Err(CombatError::EncounterNotActive);
    }

    let mut ticks = TurnTicks::default();
    let outgoing_id = *state
        .turn_order
        .get(state.current_turn_index)
        .ok_or(CombatError::EncounterNotActive)?;
    if let Some(outgoing) = state.participants.iter_mut().find(|p| p.id == outgoing_id) {
        ticks.condition_ticks.extend(process_end_of_turn(outgoing, rng)?);
    }
    ticks.aura_ticks.extend(reevaluate_auras(state, AuraTrigger::EndOfTurn, rng)?);

    let next_index = state.current_turn_index.saturating_add(1);
    if next_index >= state.turn_order.len() {
        state.current_turn_index = 0;
        state.round = state.round.saturating_add(1);
    } else {
        state.current_turn_index = next_index;
    }
    state.updated_at = now;

    let current_id = *state
        .turn_order
        .get(state.current_turn_index)
        .ok_or(CombatError::EncounterNotActive)?;
    let participant = state
        .participants
        .iter_mut()
        .find(|p| p.id == current_id)
        .ok_or(CombatError::ParticipantNotFound(current_id))?;

    start_turn(participant);
    ticks
        .condition_ticks
        .extend(process_duration_trigger(participant, DurationType::StartOfTurn, rng)?);
    ticks.aura_ticks.extend(reevaluate_auras(state, AuraTrigger::StartOfTurn, rng)?);
    Ok(ticks)
}

/// End an encounter, marking it `Completed` and returning the final hit
/// points of every participant for syncing back to their source characters.
///
/// # Errors
/// Returns [`CombatError::EncounterNotActive`] if the encounter is already completed.
pub fn end_encounter(
    state: &mut CombatState,
    now: DateTime<Utc>,
) -> Result<Vec<(rpgkernel_types::ParticipantId, i32)>, CombatError> {
    if state.status == EncounterStatus::Completed {
        return Err(CombatError::EncounterNotActive);
    }
    state.status = EncounterStatus::Completed;
    state.updated_at = now;
    Ok(state.participants.iter().map(|p| (p.id, p.hp)).collect())
}

/// The participant whose turn it currently is.
#[must_use]
pub fn current_participant(state: &CombatState) -> Option<&Participant> {
    let id = state.turn_order.get(state.current_turn_index)?;
    state.participants.iter().find(|p| p.id == *id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rpgkernel_types::ParticipantId;

    fn make_participant(name: &str) -> Participant {
        Participant {
            id: ParticipantId::new(),
            source_character_id: None,
            name: name.to_owned(),
            initiative_bonus: 0,
            initiative: 0,
            is_enemy: false,
            hp: 10,
            max_hp: 10,
            conditions: Vec::new(),
            position: None,
            movement_speed: 30,
            movement_remaining: 30,
            action_used: true,
            bonus_action_used: true,
            reaction_used: true,
            has_dashed: false,
            has_disengaged: false,
            free_interaction_used: false,
            resistances: Default::default(),
            vulnerabilities: Default::default(),
            immunities: Default::default(),
        }
    }

    #[test]
    fn create_encounter_seats_first_turn_and_resets_economy() {
        let participants = vec![make_participant("A"), make_participant("B")];
        let mut rng = DeterministicRng::from_seed("encounter-test");
        let state = create_encounter(
            EncounterId::new(),
            None,
            participants,
            None,
            &mut rng,
            Utc::now(),
        );
        assert_eq!(state.round, 1);
        assert_eq!(state.current_turn_index, 0);
        assert_eq!(state.status, EncounterStatus::Active);
        assert!(state.participants.iter().all(|p| !p.action_used));
    }

    #[test]
    fn advance_turn_wraps_and_increments_round() {
        let participants = vec![make_participant("A"), make_participant("B")];
        let mut rng = DeterministicRng::from_seed("encounter-test-2");
        let mut state = create_encounter(
            EncounterId::new(),
            None,
            participants,
            None,
            &mut rng,
            Utc::now(),
        );
        advance_turn(&mut state, &mut rng, Utc::now()).expect("ok");
        assert_eq!(state.current_turn_index, 1);
        assert_eq!(state.round, 1);
        advance_turn(&mut state, &mut rng, Utc::now()).expect("ok");
        assert_eq!(state.current_turn_index, 0);
        assert_eq!(state.round, 2);
    }

    #[test]
    fn end_encounter_marks_completed_and_reports_hp() {
        let participants = vec![make_participant("A")];
        let mut rng = DeterministicRng::from_seed("encounter-test-3");
        let mut state = create_encounter(
            EncounterId::new(),
            None,
            participants,
            None,
            &mut rng,
            Utc::now(),
        );
        let report = end_encounter(&mut state, Utc::now()).expect("ok");
        assert_eq!(state.status, EncounterStatus::Completed);
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn advance_turn_fails_once_encounter_completed() {
        let participants = vec![make_participant("A")];
        let mut rng = DeterministicRng::from_seed("encounter-test-4");
        let mut state = create_encounter(
            EncounterId::new(),
            None,
            participants,
            None,
            &mut rng,
            Utc::now(),
        );
        end_encounter(&mut state, Utc::now()).expect("ok");
        assert!(advance_turn(&mut state, &mut rng, Utc::now()).is_err());
    }
}
