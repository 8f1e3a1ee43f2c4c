//! Damage typing: resistance, vulnerability, and immunity application.

use rpgkernel_types::{DamageType, Participant};

/// Apply a damage type's resistance/vulnerability/immunity modifiers to a
/// raw amount: immune → 0, resisted → `floor(raw / 2)`,
/// vulnerable → `floor(raw * 2)`, otherwise unchanged.
///
/// Vulnerability and resistance never stack (immunity wins over both, and
/// a damage type is never both resisted and vulnerable on the same
/// participant in this model), per `spec.md` §4.D.3.
#[must_use]
pub fn apply_damage_modifiers(participant: &Participant, damage_type: DamageType, raw: i32) -> i32 {
    if participant.immunities.contains(&damage_type) {
        return 0;
    }
    if participant.resistances.contains(&damage_type) {
        return raw.div_euclid(2);
    }
    if participant.vulnerabilities.contains(&damage_type) {
        return raw.saturating_mul(2);
    }
    raw
}

/// Apply damage to a participant's hit points, clamping at 0, and return
/// the actual hit-point delta applied (post-modifier).
pub fn apply_damage(participant: &mut Participant, damage_type: DamageType, raw: i32) -> i32 {
    let modified = apply_damage_modifiers(participant, damage_type, raw);
    let before = participant.hp;
    participant.hp = participant.hp.saturating_sub(modified).max(0);
    before.saturating_sub(participant.hp)
}

/// Apply healing to a participant, clamping at `max_hp`, and return the
/// actual hit-point delta applied.
pub fn apply_healing(participant: &mut Participant, amount: i32) -> i32 {
    let before = participant.hp;
    participant.hp = participant.hp.saturating_add(amount).min(participant.max_hp);
    participant.hp.saturating_sub(before)
}

/// Concentration save DC for a given amount of damage taken:
/// `max(10, floor(damage / 2))`, per `spec.md` §4.D.7.
#[must_use]
pub const fn concentration_dc(damage_taken: i32) -> i32 {
    let half = damage_taken.div_euclid(2);
    if half > 10 {
        half
    } else {
        10
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpgkernel_types::ParticipantId;
    use std::collections::BTreeSet;

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
            resistances: BTreeSet::new(),
            vulnerabilities: BTreeSet::new(),
            immunities: BTreeSet::new(),
        }
    }

    #[test]
    fn resistance_halves_damage() {
        let mut participant = make_participant();
        participant.resistances.insert(DamageType::Fire);
        let delta = apply_damage(&mut participant, DamageType::Fire, 11);
        assert_eq!(delta, 5);
    }

    #[test]
    fn vulnerability_doubles_damage() {
        let mut participant = make_participant();
        participant.vulnerabilities.insert(DamageType::Cold);
        let delta = apply_damage(&mut participant, DamageType::Cold, 6);
        assert_eq!(delta, 12);
    }

    #[test]
    fn immunity_negates_damage() {
        let mut participant = make_participant();
        participant.immunities.insert(DamageType::Poison);
        let delta = apply_damage(&mut participant, DamageType::Poison, 50);
        assert_eq!(delta, 0);
        assert_eq!(participant.hp, 20);
    }

    #[test]
    fn damage_does_not_drop_hp_below_zero() {
        let mut participant = make_participant();
        apply_damage(&mut participant, DamageType::Bludgeoning, 1000);
        assert_eq!(participant.hp, 0);
    }

    #[test]
    fn healing_does_not_exceed_max_hp() {
        let mut participant = make_participant();
        participant.hp = 18;
        let delta = apply_healing(&mut participant, 10);
        assert_eq!(delta, 2);
        assert_eq!(participant.hp, 20);
    }

    #[test]
    fn concentration_dc_has_a_floor_of_ten() {
        assert_eq!(concentration_dc(4), 10);
        assert_eq!(concentration_dc(30), 15);
    }
}
