//! Configuration loading for the kernel process.
//!
//! Defaults are laid down in code, an optional `rpgkernel.yaml` overlays
//! them, and `RPG_`-prefixed environment variables take final precedence —
//! the same layering `emergence-core::config` uses, via the `config` crate
//! instead of hand-rolled `serde_yml`/`std::env::var` plumbing.

use config::{Config, Environment, File};
use rpgkernel_types::DamageType;
use rpgkernel_world::WorldGenConfig;
use serde::Deserialize;
use thiserror::Error;

/// Errors produced while loading [`KernelConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `config` crate failed to build or deserialize the layered sources.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Default movement speed and reach assumptions for combat, absent an
/// explicit per-character override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CombatDefaults {
    /// Feet of movement per turn for a participant with no speed override.
    pub default_movement_speed: u32,
    /// Feet of melee reach for a participant with no reach override.
    pub default_reach_feet: u32,
    /// Flat attack bonus rolled for an opportunity attack's "standard values", per `spec.md` §4.D.4 step 4.
    pub opportunity_attack_bonus: i32,
    /// Target armor class assumed for an opportunity attack's roll.
    pub opportunity_attack_target_ac: i32,
    /// Damage expression rolled by an opportunity attack.
    pub opportunity_attack_damage_expr: String,
    /// Damage type dealt by an opportunity attack.
    pub opportunity_attack_damage_type: DamageType,
}

impl Default for CombatDefaults {
    fn default() -> Self {
        Self {
            default_movement_speed: 30,
            default_reach_feet: 5,
            opportunity_attack_bonus: 4,
            opportunity_attack_target_ac: 13,
            opportunity_attack_damage_expr: "1d6+2".to_owned(),
            opportunity_attack_damage_type: DamageType::Slashing,
        }
    }
}

/// Connection pool tuning for the `PostgreSQL` backend, mirroring
/// `emergence-db::postgres::PostgresConfig`'s defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PostgresPoolConfig {
    /// Connection string (`RPG_DATABASE_URL`/`DATABASE_URL`, default a local instance).
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Seconds allowed to establish a new connection.
    pub connect_timeout_secs: u64,
    /// Seconds a pooled connection may sit idle before recycling.
    pub idle_timeout_secs: u64,
}

impl Default for PostgresPoolConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/rpgkernel".to_owned(),
            max_connections: 10,
            connect_timeout_secs: 8,
            idle_timeout_secs: 300,
        }
    }
}

fn default_world_gen() -> WorldGenConfig {
    WorldGenConfig::default()
}

/// Complete kernel configuration: storage backend, world-generation defaults,
/// combat defaults, and Postgres pool tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// When true (`NODE_ENV=test`), the kernel backs every repository with
    /// the in-memory store instead of `PostgreSQL`.
    pub test_mode: bool,
    /// Defaults handed to `rpgkernel_world::generate_world` when a tool call
    /// omits them.
    pub world_gen: WorldGenConfig,
    /// Default movement/reach assumptions for combat.
    pub combat: CombatDefaults,
    /// Postgres connection pool tuning.
    pub postgres: PostgresPoolConfig,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            test_mode: false,
            world_gen: default_world_gen(),
            combat: CombatDefaults::default(),
            postgres: PostgresPoolConfig::default(),
        }
    }
}

impl KernelConfig {
    /// Load configuration: built-in defaults, overlaid by `rpgkernel.yaml`
    /// in the current directory if present, overlaid by `RPG_*` environment
    /// variables, with `NODE_ENV=test` forcing `test_mode`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Load`] if `rpgkernel.yaml` exists but fails to
    /// parse, or an `RPG_*` override fails to coerce to its field's type.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config: Self = Config::builder()
            .add_source(File::with_name("rpgkernel").required(false))
            .add_source(Environment::with_prefix("RPG").separator("__"))
            .build()?
            .try_deserialize()?;

        if std::env::var("NODE_ENV").as_deref() == Ok("test") {
            config.test_mode = true;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.postgres.url = url;
        }

        Ok(config)
    }
}
