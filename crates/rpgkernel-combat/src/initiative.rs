//! Initiative rolling and turn-order resolution.

use rpgkernel_dice::{d20, DeterministicRng};
use rpgkernel_types::{Participant, ParticipantId};

/// Roll initiative for every participant (`1d20 + initiative_bonus`),
/// mutating each [`Participant::initiative`], and return the resulting
/// turn order sorted highest-to-lowest. Ties break by initiative bonus,
/// then by participant id, for determinism.
pub fn roll_initiative(participants: &mut [Participant], rng: &mut DeterministicRng) -> Vec<ParticipantId> {
    let mut initiative_rng = rng.fork("initiative");
    for participant in participants.iter_mut() {
        let roll = d20(&mut initiative_rng);
        participant.initiative = roll.saturating_add(participant.initiative_bonus);
    }

    let mut order: Vec<&Participant> = participants.iter().collect();
    order.sort_by(|a, b| {
        b.initiative
            .cmp(&a.initiative)
            .then(b.initiative_bonus.cmp(&a.initiative_bonus))
            .then(a.id.cmp(&b.id))
    });

    order.into_iter().map(|p| p.id).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rpgkernel_types::ParticipantId;

    fn make_participant(bonus: i32) -> Participant {
        Participant {
            id: ParticipantId::new(),
            source_character_id: None,
            name: "Test".to_owned(),
            initiative_bonus: bonus,
            initiative: 0,
            is_enemy: false,
            hp: 10,
            max_hp: 10,
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
    fn turn_order_is_sorted_descending() {
        let mut participants = vec![make_participant(0), make_participant(5), make_participant(-2)];
        let mut rng = DeterministicRng::from_seed("init-test");
        let order = roll_initiative(&mut participants, &mut rng);
        assert_eq!(order.len(), 3);
        let initiatives: Vec<i32> = order
            .iter()
            .map(|id| participants.iter().find(|p| p.id == *id).expect("participant").initiative)
            .collect();
        assert!(initiatives.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn initiative_rolling_is_deterministic() {
        let mut a = vec![make_participant(2), make_participant(2)];
        let mut b = a.clone();
        let order_a = roll_initiative(&mut a, &mut DeterministicRng::from_seed("seed-x"));
        let order_b = roll_initiative(&mut b, &mut DeterministicRng::from_seed("seed-x"));
        let init_a: Vec<i32> = a.iter().map(|p| p.initiative).collect();
        let init_b: Vec<i32> = b.iter().map(|p| p.initiative).collect();
        assert_eq!(init_a, init_b);
        assert_eq!(order_a.len(), order_b.len());
    }
}
