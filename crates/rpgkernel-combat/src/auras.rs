//! Aura effect firing: radius-of-effect zones tied to concentration.

use rpgkernel_dice::{check_degree, d20, roll_expr, DeterministicRng};
use rpgkernel_types::{Aura, AuraEffect, AuraTrigger, CheckDegree, CombatState, Participant, ParticipantId, Position};
use rpgkernel_spatial::chebyshev_distance;
use serde::{Deserialize, Serialize};

use crate::error::CombatError;

/// A single aura-effect tick against one affected participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraTick {
    /// Negative for damage, positive for healing.
    pub hp_delta: i32,
    /// Whether the affected participant's save halved the effect.
    pub saved: bool,
}

/// Whether `participant` falls within `aura`'s radius around `owner_position`.
#[must_use]
pub fn is_within_aura(
    aura_owner_position: rpgkernel_types::Position,
    participant_position: rpgkernel_types::Position,
    aura: &Aura,
) -> bool {
    let tiles = chebyshev_distance(
        (aura_owner_position.x, aura_owner_position.y),
        (participant_position.x, participant_position.y),
    );
    rpgkernel_spatial::tiles_to_feet(tiles) <= aura.radius
}

/// Whether `aura` affects `participant`, given whether they are the owner
/// and whether they are hostile to the owner.
#[must_use]
pub fn aura_affects(aura: &Aura, is_owner: bool, participant_is_enemy_of_owner: bool) -> bool {
    if is_owner {
        return aura.affects_self;
    }
    if participant_is_enemy_of_owner {
        aura.affects_enemies
    } else {
        aura.affects_allies
    }
}

/// Fire every effect on `aura` matching `trigger` against `participant`,
/// applying a saving throw (if the effect carries one) that halves the
/// effect on success, and return the resulting ticks.
///
/// # Errors
/// Returns [`CombatError::Dice`] if an effect's dice expression is malformed.
pub fn fire_aura_effects(
    aura: &Aura,
    trigger: AuraTrigger,
    participant: &mut Participant,
    save_modifier: i32,
    rng: &mut DeterministicRng,
) -> Result<Vec<AuraTick>, CombatError> {
    let mut ticks = Vec::new();
    for effect in &aura.effects {
        if effect.trigger != trigger {
            continue;
        }
        let tick = resolve_effect(effect, participant, save_modifier, rng)?;
        ticks.push(tick);
    }
    Ok(ticks)
}

fn resolve_effect(
    effect: &AuraEffect,
    participant: &mut Participant,
    save_modifier: i32,
    rng: &mut DeterministicRng,
) -> Result<AuraTick, CombatError> {
    let base = if let Some(expr) = effect.dice.as_deref() {
        roll_expr(rng, expr)?.total
    } else {
        effect.amount.unwrap_or(0)
    };

    let (amount, saved) = if let Some(dc) = effect.save_dc {
        let natural = d20(rng);
        let total = natural.saturating_add(save_modifier);
        let degree = check_degree(natural, total, dc);
        let succeeded = matches!(degree, CheckDegree::Success | CheckDegree::CriticalSuccess);
        if succeeded {
            (base.div_euclid(2), true)
        } else {
            (base, false)
        }
    } else {
        (base, false)
    };

    let delta = if effect.is_damage { -amount } else { amount };
    if delta < 0 {
        participant.hp = participant.hp.saturating_add(delta).max(0);
    } else {
        participant.hp = participant.hp.saturating_add(delta).min(participant.max_hp);
    }

    Ok(AuraTick { hp_delta: delta, saved })
}

fn owner_position_and_enmity(state: &CombatState, owner_id: ParticipantId) -> Option<(Position, bool)> {
    state.participants.iter().find(|p| p.id == owner_id).and_then(|p| p.position.map(|pos| (pos, p.is_enemy)))
}

/// Re-run every live aura's `trigger` effects against the current roster,
/// per `spec.md` §4.D.7. Used at round/turn boundaries for
/// `StartOfTurn`/`EndOfTurn` triggers.
///
/// # Errors
/// Returns [`CombatError::Dice`] if an aura effect's dice expression is malformed.
pub fn reevaluate_auras(
    state: &mut CombatState,
    trigger: AuraTrigger,
    rng: &mut DeterministicRng,
) -> Result<Vec<AuraTick>, CombatError> {
    let mut ticks = Vec::new();
    let auras = state.auras.clone();
    for aura in &auras {
        let Some((owner_position, owner_is_enemy)) = owner_position_and_enmity(state, aura.owner_id) else {
            continue;
        };

        for participant in &mut state.participants {
            let Some(position) = participant.position else { continue };
            let is_owner = participant.id == aura.owner_id;
            if !is_within_aura(owner_position, position, aura) {
                continue;
            }
            if !aura_affects(aura, is_owner, participant.is_enemy != owner_is_enemy) {
                continue;
            }
            ticks.extend(fire_aura_effects(aura, trigger, participant, 0, rng)?);
        }
    }
    Ok(ticks)
}

/// Re-run `Enter`/`Exit` aura effects triggered by one participant's move,
/// comparing its pre- and post-move positions against every live aura's
/// radius, per `spec.md` §4.D.7.
///
/// # Errors
/// Returns [`CombatError::Dice`] if an aura effect's dice expression is malformed.
pub fn reevaluate_auras_for_move(
    state: &mut CombatState,
    mover_id: ParticipantId,
    from: Position,
    to: Position,
    rng: &mut DeterministicRng,
) -> Result<Vec<AuraTick>, CombatError> {
    let mut ticks = Vec::new();
    let auras = state.auras.clone();
    let mover_is_enemy = state.participants.iter().find(|p| p.id == mover_id).is_some_and(|p| p.is_enemy);

    for aura in &auras {
        let Some((owner_position, owner_is_enemy)) = owner_position_and_enmity(state, aura.owner_id) else {
            continue;
        };
        let is_owner = mover_id == aura.owner_id;
        if !aura_affects(aura, is_owner, mover_is_enemy != owner_is_enemy) {
            continue;
        }

        let was_within = is_within_aura(owner_position, from, aura);
        let now_within = is_within_aura(owner_position, to, aura);
        let trigger = if !was_within && now_within {
            AuraTrigger::Enter
        } else if was_within && !now_within {
            AuraTrigger::Exit
        } else {
            continue;
        };

        if let Some(mover) = state.participants.iter_mut().find(|p| p.id == mover_id) {
            ticks.extend(fire_aura_effects(aura, trigger, mover, 0, rng)?);
        }
    }
    Ok(ticks)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rpgkernel_types::{ParticipantId, Position};

    fn make_aura(effects: Vec<AuraEffect>) -> Aura {
        Aura {
            id: rpgkernel_types::AuraId::new(),
            owner_id: ParticipantId::new(),
            spell_name: "Spirit Guardians".to_owned(),
            spell_level: 3,
            radius: 15,
            affects_self: false,
            affects_allies: false,
            affects_enemies: true,
            effects,
            requires_concentration: true,
            started_at_round: 1,
            max_duration_rounds: Some(100),
        }
    }

    fn make_participant() -> Participant {
        Participant {
            id: ParticipantId::new(),
            source_character_id: None,
            name: "Target".to_owned(),
            initiative_bonus: 0,
            initiative: 0,
            is_enemy: true,
            hp: 20,
            max_hp: 20,
            conditions: Vec::new(),
            position: Some(Position { x: 0, y: 0 }),
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
    fn within_radius_is_affected() {
        let aura = make_aura(Vec::new());
        let owner_position = Position { x: 0, y: 0 };
        let participant_position = Position { x: 2, y: 0 };
        assert!(is_within_aura(owner_position, participant_position, &aura));
    }

    #[test]
    fn beyond_radius_is_not_affected() {
        let aura = make_aura(Vec::new());
        let owner_position = Position { x: 0, y: 0 };
        let participant_position = Position { x: 10, y: 0 };
        assert!(!is_within_aura(owner_position, participant_position, &aura));
    }

    #[test]
    fn failed_save_applies_full_damage() {
        let aura = make_aura(vec![AuraEffect {
            trigger: AuraTrigger::StartOfTurn,
            is_damage: true,
            amount: Some(10),
            dice: None,
            save_dc: Some(30),
            save_ability: None,
        }]);
        let mut participant = make_participant();
        let mut rng = DeterministicRng::from_seed("aura-test");
        let ticks = fire_aura_effects(&aura, AuraTrigger::StartOfTurn, &mut participant, 0, &mut rng)
            .expect("ok");
        assert_eq!(ticks.len(), 1);
        assert_eq!(participant.hp, 10);
    }

    #[test]
    fn successful_save_halves_damage() {
        let aura = make_aura(vec![AuraEffect {
            trigger: AuraTrigger::StartOfTurn,
            is_damage: true,
            amount: Some(10),
            dice: None,
            save_dc: Some(1),
            save_ability: None,
        }]);
        let mut participant = make_participant();
        let mut rng = DeterministicRng::from_seed("aura-test-2");
        fire_aura_effects(&aura, AuraTrigger::StartOfTurn, &mut participant, 20, &mut rng).expect("ok");
        assert_eq!(participant.hp, 15);
    }

    #[test]
    fn affects_enemies_only_aura_does_not_affect_owner() {
        let aura = make_aura(Vec::new());
        assert!(!aura_affects(&aura, true, false));
        assert!(aura_affects(&aura, false, true));
        assert!(!aura_affects(&aura, false, false));
    }

    fn make_owner(id: ParticipantId, position: Position) -> Participant {
        Participant {
            id,
            source_character_id: None,
            name: "Owner".to_owned(),
            initiative_bonus: 0,
            initiative: 0,
            is_enemy: false,
            hp: 20,
            max_hp: 20,
            conditions: Vec::new(),
            position: Some(position),
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

    fn make_state(owner: Participant, target: Participant, auras: Vec<Aura>) -> CombatState {
        CombatState {
            id: rpgkernel_types::EncounterId::new(),
            world_id: None,
            participants: vec![owner, target],
            turn_order: Vec::new(),
            current_turn_index: 0,
            round: 1,
            terrain: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            status: rpgkernel_types::EncounterStatus::Active,
            concentrations: Vec::new(),
            auras,
        }
    }

    #[test]
    fn reevaluate_auras_damages_in_radius_enemy_on_start_of_turn() {
        let owner_id = ParticipantId::new();
        let owner = make_owner(owner_id, Position { x: 0, y: 0 });
        let mut target = make_participant();
        target.position = Some(Position { x: 2, y: 0 });
        let mut aura = make_aura(vec![AuraEffect {
            trigger: AuraTrigger::StartOfTurn,
            is_damage: true,
            amount: Some(5),
            dice: None,
            save_dc: None,
            save_ability: None,
        }]);
        aura.owner_id = owner_id;
        let mut state = make_state(owner, target, vec![aura]);
        let mut rng = DeterministicRng::from_seed("reevaluate-auras-test");

        let ticks = reevaluate_auras(&mut state, AuraTrigger::StartOfTurn, &mut rng).expect("ok");
        assert_eq!(ticks.len(), 1);
        let target = state.participants.iter().find(|p| p.id != owner_id).expect("target present");
        assert_eq!(target.hp, 15);
    }

    #[test]
    fn reevaluate_auras_for_move_fires_on_enter_and_exit() {
        let owner_id = ParticipantId::new();
        let owner = make_owner(owner_id, Position { x: 0, y: 0 });
        let mover_id = ParticipantId::new();
        let mut mover = make_participant();
        mover.id = mover_id;
        mover.position = Some(Position { x: 10, y: 0 });
        let mut aura = make_aura(vec![AuraEffect {
            trigger: AuraTrigger::Enter,
            is_damage: true,
            amount: Some(4),
            dice: None,
            save_dc: None,
            save_ability: None,
        }]);
        aura.owner_id = owner_id;
        let mut state = make_state(owner, mover, vec![aura]);
        let mut rng = DeterministicRng::from_seed("reevaluate-auras-move-test");

        let entered = reevaluate_auras_for_move(
            &mut state,
            mover_id,
            Position { x: 10, y: 0 },
            Position { x: 1, y: 0 },
            &mut rng,
        )
        .expect("ok");
        assert_eq!(entered.len(), 1);
        let mover_hp = |state: &CombatState| {
            state.participants.iter().find(|p| p.id == mover_id).expect("mover present").hp
        };
        assert_eq!(mover_hp(&state), 16);

        let stayed = reevaluate_auras_for_move(
            &mut state,
            mover_id,
            Position { x: 1, y: 0 },
            Position { x: 0, y: 1 },
            &mut rng,
        )
        .expect("ok");
        assert!(stayed.is_empty());
        assert_eq!(mover_hp(&state), 16);
    }
}
