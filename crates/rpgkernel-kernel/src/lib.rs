//! Tool-handler surface, session context, and process wiring for the RPG
//! simulation kernel.
//!
//! This crate is the seam between a transport (stdio, HTTP, an in-process
//! embedding) and the domain crates (`rpgkernel-world`, `rpgkernel-combat`,
//! `rpgkernel-mappatch`, `rpgkernel-dice`, `rpgkernel-db`, `rpgkernel-events`).
//! It owns none of the simulation rules itself; it wires a request to the
//! right domain call, audits it, and persists the result.
//!
//! # Modules
//!
//! - [`config`] -- Layered configuration: built-in defaults, `rpgkernel.yaml`,
//!   `RPG_*`/`DATABASE_URL` environment overrides.
//! - [`context`] -- [`KernelContext`], the per-session state bundle, and
//!   [`Store`], the in-memory/`PostgreSQL` backend switch.
//! - [`error`] -- [`KernelError`], the single error taxonomy every tool
//!   handler returns.
//! - [`tools`] -- One handler per tool call: world generation, map patching,
//!   and the combat action surface.

pub mod config;
pub mod context;
pub mod error;
pub mod tools;

pub use config::{CombatDefaults, ConfigError, KernelConfig, PostgresPoolConfig};
pub use context::{KernelContext, Store};
pub use error::KernelError;
pub use tools::{
    combat_advance_turn, combat_create_encounter, combat_end_encounter,
    combat_execute_action, combat_get_encounter_state, events_subscribe, map_patch_apply,
    map_patch_preview, world_generate, world_get_state, ActionParameters, CreateEncounterArgs,
    ExecuteActionArgs, ParticipantInput, ToolResponse, WorldGenerateArgs, WorldStateSummary,
};
