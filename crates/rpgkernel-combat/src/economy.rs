//! Action-economy bookkeeping: action, bonus action, reaction, and movement slots.
//!
//! Reactions refresh only at the start of the participant's *own* turn, not
//! at the start of every participant's turn, per `spec.md` §4.D.4.

use rpgkernel_types::{ConditionType, Participant};

/// Reset a participant's per-turn action-economy slots at the start of
/// their own turn.
pub fn start_turn(participant: &mut Participant) {
    participant.action_used = false;
    participant.bonus_action_used = false;
    participant.reaction_used = false;
    participant.has_dashed = false;
    participant.has_disengaged = false;
    participant.free_interaction_used = false;
    participant.movement_remaining = effective_speed(participant);
}

/// A participant's movement speed after condition-based speed overrides
/// (`Grappled`/`Restrained` zero it; `Prone` leaves it unchanged but is
/// applied elsewhere as an attack-roll penalty, not a speed penalty).
#[must_use]
pub fn effective_speed(participant: &Participant) -> u32 {
    let zeroed = participant
        .conditions
        .iter()
        .any(|c| matches!(c.condition_type, ConditionType::Grappled | ConditionType::Restrained));
    if zeroed {
        0
    } else {
        participant.movement_speed
    }
}

/// Whether a participant can currently take any action at all (not
/// incapacitated by stun/paralysis/unconsciousness/petrification).
#[must_use]
pub fn is_incapacitated(participant: &Participant) -> bool {
    participant.conditions.iter().any(|c| {
        matches!(
            c.condition_type,
            ConditionType::Stunned
                | ConditionType::Paralyzed
                | ConditionType::Unconscious
                | ConditionType::Petrified
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpgkernel_types::{Condition, ConditionId, DurationType, ParticipantId};

    fn make_participant() -> Participant {
        Participant {
            id: ParticipantId::new(),
            source_character_id: None,
            name: "Test".to_owned(),
            initiative_bonus: 0,
            initiative: 10,
            is_enemy: false,
            hp: 10,
            max_hp: 10,
            conditions: Vec::new(),
            position: None,
            movement_speed: 30,
            movement_remaining: 0,
            action_used: true,
            bonus_action_used: true,
            reaction_used: true,
            has_dashed: true,
            has_disengaged: true,
            free_interaction_used: true,
            resistances: Default::default(),
            vulnerabilities: Default::default(),
            immunities: Default::default(),
        }
    }

    #[test]
    fn start_turn_resets_all_slots() {
        let mut participant = make_participant();
        start_turn(&mut participant);
        assert!(!participant.action_used);
        assert!(!participant.bonus_action_used);
        assert!(!participant.reaction_used);
        assert!(!participant.has_dashed);
        assert!(!participant.has_disengaged);
        assert_eq!(participant.movement_remaining, 30);
    }

    #[test]
    fn grappled_zeroes_effective_speed() {
        let mut participant = make_participant();
        participant.conditions.push(Condition {
            id: ConditionId::new(),
            condition_type: ConditionType::Grappled,
            duration_type: DurationType::Permanent,
            duration: None,
            save_dc: None,
            save_ability: None,
            ongoing_effects: Vec::new(),
        });
        assert_eq!(effective_speed(&participant), 0);
    }

    #[test]
    fn stunned_is_incapacitated() {
        let mut participant = make_participant();
        participant.conditions.push(Condition {
            id: ConditionId::new(),
            condition_type: ConditionType::Stunned,
            duration_type: DurationType::Rounds,
            duration: Some(1),
            save_dc: None,
            save_ability: None,
            ongoing_effects: Vec::new(),
        });
        assert!(is_incapacitated(&participant));
    }

    #[test]
    fn healthy_participant_is_not_incapacitated() {
        assert!(!is_incapacitated(&make_participant()));
    }
}
