//! Kernel process entry point.
//!
//! Tool registries, per-tool envelope formatting, and transport framing
//! (stdio/TCP/named-socket) are deliberately out of scope here — they're
//! supplied by whatever embeds this crate. This binary's job is the part
//! that *is* in scope: load configuration, stand up one [`KernelContext`]
//! for the process's session, and hold it open until shut down.

use rpgkernel_db::connect;
use rpgkernel_events::SimClock;
use rpgkernel_kernel::{KernelConfig, KernelContext, Store};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("rpgkernel starting");

    let config = KernelConfig::load()?;
    info!(
        test_mode = config.test_mode,
        default_movement_speed = config.combat.default_movement_speed,
        world_gen_octaves = config.world_gen.octaves,
        "configuration loaded"
    );

    let store = if config.test_mode {
        info!("NODE_ENV=test: backing every repository with the in-memory store");
        Store::in_memory()
    } else {
        let pool = connect(&config.postgres.url, config.postgres.max_connections).await?;
        info!(max_connections = config.postgres.max_connections, "connected to PostgreSQL");
        Store::Postgres(pool)
    };

    let session_id = Uuid::now_v7().to_string();
    let clock = SimClock::new(chrono::Utc::now());
    let context = KernelContext::new(session_id.clone(), store, clock);
    info!(session_id, "kernel context ready, awaiting shutdown signal");

    tokio::signal::ctrl_c().await?;
    info!(session_id = context.session_id(), "shutdown signal received, exiting");

    Ok(())
}
