//! Turn-based combat resolution for the RPG simulation kernel.
//!
//! Covers initiative, action economy, damage typing, conditions, advantage
//! resolution, attack/heal/move/dash/disengage/opportunity-attack actions,
//! auras, concentration, and encounter lifecycle, per `spec.md` §4.D.

pub mod actions;
pub mod advantage;
pub mod auras;
pub mod concentration;
pub mod conditions;
pub mod damage;
pub mod economy;
pub mod encounter;
pub mod error;
pub mod initiative;

pub use actions::{
    provokes_opportunity_attack, resolve_attack, resolve_dash, resolve_disengage, resolve_heal,
    resolve_move, resolve_opportunity_attack, AttackOutcome,
};
pub use advantage::{attack_roll_state, check_has_disadvantage};
pub use auras::{aura_affects, fire_aura_effects, is_within_aura, reevaluate_auras, reevaluate_auras_for_move, AuraTick};
pub use concentration::{apply_concentration_damage_check, attach_aura, begin_concentration, check_concentration};
pub use conditions::{
    apply_condition, process_duration_trigger, process_end_of_turn, remove_condition, try_end_save, EffectTick,
};
pub use damage::{apply_damage, apply_damage_modifiers, apply_healing, concentration_dc};
pub use economy::{effective_speed, is_incapacitated, start_turn};
pub use encounter::{advance_turn, create_encounter, current_participant, end_encounter, TurnTicks};
pub use error::CombatError;
pub use initiative::roll_initiative;
