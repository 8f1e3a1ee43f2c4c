//! Per-session kernel state: the namespaced encounter registry, the event
//! bus, the simulation clock, and the storage backend.
//!
//! `rpgkernel-db`'s repository traits use native `async fn` in traits, which
//! are not object-safe — there is no `&dyn WorldRepository`. `Store`
//! sidesteps that by being a concrete enum over the two backends rather than
//! a trait object, with one inherent method per repository operation that
//! matches on the variant and calls through to the concrete `Pg*`/`InMemory*`
//! type. Production wires one `KernelContext` per session (spec.md §9); there
//! is no process-wide singleton.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rpgkernel_db::{
    AuditRepository, CharacterRepository, DbError, EncounterRepository, EventRepository,
    InMemoryAuditRepository, InMemoryCharacterRepository, InMemoryEncounterRepository,
    InMemoryEventRepository, InMemoryRegionRepository, InMemoryStructureRepository,
    InMemoryTileRepository, InMemoryWorldRepository, PgAuditRepository, PgCharacterRepository,
    PgEncounterRepository, PgEventRepository, PgRegionRepository, PgStructureRepository,
    PgTileRepository, PgWorldRepository, RegionRepository, StructureRepository, TileRepository,
    WorldRepository,
};
use rpgkernel_events::{EventBus, SimClock};
use rpgkernel_types::{
    AuditEntry, Character, CharacterId, CombatState, EncounterId, Event, Region, RiverSegment,
    Structure, StructureId, Tile, Topic, World, WorldId,
};
use sqlx::PgPool;

use crate::error::KernelError;

/// The eight in-memory repositories, bundled for the `NODE_ENV=test` backend.
#[derive(Default)]
pub struct InMemoryRepos {
    worlds: InMemoryWorldRepository,
    tiles: InMemoryTileRepository,
    regions: InMemoryRegionRepository,
    structures: InMemoryStructureRepository,
    characters: InMemoryCharacterRepository,
    encounters: InMemoryEncounterRepository,
    audit: InMemoryAuditRepository,
    events: InMemoryEventRepository,
}

/// The storage backend a session is wired against.
pub enum Store {
    /// `NODE_ENV=test`: every repository backed by an in-process `Mutex`-guarded store.
    InMemory(InMemoryRepos),
    /// Default: every repository backed by `PostgreSQL` through one shared pool.
    Postgres(PgPool),
}

impl Store {
    /// Build the in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::InMemory(InMemoryRepos::default())
    }

    // -- worlds ------------------------------------------------------------

    /// Persist a newly generated world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the write fails.
    pub async fn create_world(&self, world: &World) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.worlds.create(world).await,
            Self::Postgres(pool) => PgWorldRepository::new(pool).create(world).await,
        }
        .map_err(Into::into)
    }

    /// Fetch a world by id.
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if no world with `id` exists.
    pub async fn get_world(&self, id: WorldId) -> Result<World, KernelError> {
        match self {
            Self::InMemory(repos) => repos.worlds.get(id).await,
            Self::Postgres(pool) => PgWorldRepository::new(pool).get(id).await,
        }
        .map_err(Into::into)
    }

    // -- tiles ---------------------------------------------------------------

    /// Persist a batch of tiles for a world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the write fails.
    pub async fn save_tiles(&self, tiles: &[Tile]) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.tiles.save_many(tiles).await,
            Self::Postgres(pool) => PgTileRepository::new(pool).save_many(tiles).await,
        }
        .map_err(Into::into)
    }

    /// List every tile belonging to a world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the read fails.
    pub async fn list_tiles(&self, world_id: WorldId) -> Result<Vec<Tile>, KernelError> {
        match self {
            Self::InMemory(repos) => repos.tiles.list_by_world(world_id).await,
            Self::Postgres(pool) => PgTileRepository::new(pool).list_by_world(world_id).await,
        }
        .map_err(Into::into)
    }

    // -- regions / rivers -----------------------------------------------------

    /// Persist a batch of regions for a world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the write fails.
    pub async fn save_regions(&self, regions: &[Region]) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.regions.save_many(regions).await,
            Self::Postgres(pool) => PgRegionRepository::new(pool).save_many(regions).await,
        }
        .map_err(Into::into)
    }

    /// List every region belonging to a world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the read fails.
    pub async fn list_regions(&self, world_id: WorldId) -> Result<Vec<Region>, KernelError> {
        match self {
            Self::InMemory(repos) => repos.regions.list_by_world(world_id).await,
            Self::Postgres(pool) => PgRegionRepository::new(pool).list_by_world(world_id).await,
        }
        .map_err(Into::into)
    }

    /// Persist a batch of river segments for a world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the write fails.
    pub async fn save_rivers(&self, rivers: &[RiverSegment]) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.regions.save_rivers(rivers).await,
            Self::Postgres(pool) => PgRegionRepository::new(pool).save_rivers(rivers).await,
        }
        .map_err(Into::into)
    }

    /// List every river segment belonging to a world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the read fails.
    pub async fn list_rivers(&self, world_id: WorldId) -> Result<Vec<RiverSegment>, KernelError> {
        match self {
            Self::InMemory(repos) => repos.regions.list_rivers_by_world(world_id).await,
            Self::Postgres(pool) => PgRegionRepository::new(pool).list_rivers_by_world(world_id).await,
        }
        .map_err(Into::into)
    }

    // -- structures ------------------------------------------------------------

    /// Persist a batch of structures for a world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the write fails.
    pub async fn save_structures(&self, structures: &[Structure]) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.structures.save_many(structures).await,
            Self::Postgres(pool) => PgStructureRepository::new(pool).save_many(structures).await,
        }
        .map_err(Into::into)
    }

    /// List every structure belonging to a world.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the read fails.
    pub async fn list_structures(&self, world_id: WorldId) -> Result<Vec<Structure>, KernelError> {
        match self {
            Self::InMemory(repos) => repos.structures.list_by_world(world_id).await,
            Self::Postgres(pool) => PgStructureRepository::new(pool).list_by_world(world_id).await,
        }
        .map_err(Into::into)
    }

    /// Fetch a single structure by id.
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if no structure with `id` exists.
    pub async fn get_structure(&self, id: StructureId) -> Result<Structure, KernelError> {
        match self {
            Self::InMemory(repos) => repos.structures.get(id).await,
            Self::Postgres(pool) => PgStructureRepository::new(pool).get(id).await,
        }
        .map_err(Into::into)
    }

    /// Persist changes to an existing structure (e.g. after `MOVE_STRUCTURE`).
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if no structure with `structure.id` exists.
    pub async fn update_structure(&self, structure: &Structure) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.structures.update(structure).await,
            Self::Postgres(pool) => PgStructureRepository::new(pool).update(structure).await,
        }
        .map_err(Into::into)
    }

    // -- characters ------------------------------------------------------------

    /// Persist a newly created character.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the write fails.
    pub async fn create_character(&self, character: &Character) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.characters.create(character).await,
            Self::Postgres(pool) => PgCharacterRepository::new(pool).create(character).await,
        }
        .map_err(Into::into)
    }

    /// Fetch a character by id.
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if no character with `id` exists.
    pub async fn get_character(&self, id: CharacterId) -> Result<Character, KernelError> {
        match self {
            Self::InMemory(repos) => repos.characters.get(id).await,
            Self::Postgres(pool) => PgCharacterRepository::new(pool).get(id).await,
        }
        .map_err(Into::into)
    }

    /// Persist changes to an existing character (e.g. `endEncounter` hp sync).
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if no character with `character.id` exists.
    pub async fn update_character(&self, character: &Character) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.characters.update(character).await,
            Self::Postgres(pool) => PgCharacterRepository::new(pool).update(character).await,
        }
        .map_err(Into::into)
    }

    // -- encounters --------------------------------------------------------------

    /// Persist a newly created encounter.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the write fails.
    pub async fn create_encounter(&self, state: &CombatState) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.encounters.create(state).await,
            Self::Postgres(pool) => PgEncounterRepository::new(pool).create(state).await,
        }
        .map_err(Into::into)
    }

    /// Fetch an encounter by id.
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if no encounter with `id` exists.
    pub async fn get_encounter(&self, id: EncounterId) -> Result<CombatState, KernelError> {
        match self {
            Self::InMemory(repos) => repos.encounters.get(id).await,
            Self::Postgres(pool) => PgEncounterRepository::new(pool).get(id).await,
        }
        .map_err(Into::into)
    }

    /// Persist changes to an existing encounter.
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if no encounter with `state.id` exists.
    pub async fn update_encounter(&self, state: &CombatState) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.encounters.update(state).await,
            Self::Postgres(pool) => PgEncounterRepository::new(pool).update(state).await,
        }
        .map_err(Into::into)
    }

    /// The full audit log, in append order. `Store` also implements
    /// [`AuditRepository`] directly for use with [`rpgkernel_events::record_call`].
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the read fails.
    pub async fn list_audit(&self) -> Result<Vec<AuditEntry>, KernelError> {
        AuditRepository::list_all(self).await.map_err(Into::into)
    }

    // -- events ----------------------------------------------------------------------

    /// Append one published event to the durable log.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the write fails.
    pub async fn append_event(&self, event: &Event) -> Result<(), KernelError> {
        match self {
            Self::InMemory(repos) => repos.events.append(event).await,
            Self::Postgres(pool) => PgEventRepository::new(pool).append(event).await,
        }
        .map_err(Into::into)
    }

    /// List every durable event recorded on a topic.
    ///
    /// # Errors
    /// Returns [`KernelError::Persistence`] if the read fails.
    pub async fn list_events(&self, topic: Topic) -> Result<Vec<Event>, KernelError> {
        match self {
            Self::InMemory(repos) => repos.events.list_by_topic(topic).await,
            Self::Postgres(pool) => PgEventRepository::new(pool).list_by_topic(topic).await,
        }
        .map_err(Into::into)
    }
}

/// Lets `Store` plug directly into [`rpgkernel_events::record_call`], which
/// is generic over any `AuditRepository` rather than a concrete backend.
impl AuditRepository for Store {
    async fn append(&self, entry: &AuditEntry) -> Result<(), DbError> {
        match self {
            Self::InMemory(repos) => repos.audit.append(entry).await,
            Self::Postgres(pool) => PgAuditRepository::new(pool).append(entry).await,
        }
    }

    async fn list_all(&self) -> Result<Vec<AuditEntry>, DbError> {
        match self {
            Self::InMemory(repos) => repos.audit.list_all().await,
            Self::Postgres(pool) => PgAuditRepository::new(pool).list_all().await,
        }
    }
}

/// All mutable state scoped to one session: a namespaced encounter registry,
/// the event bus, the simulation clock, and the storage backend.
///
/// One `KernelContext` per session, per spec.md §9 — never a process-wide
/// singleton, since the in-memory encounter registry is namespaced by
/// `sessionId:encounterId` and two sessions share no mutable kernel state.
pub struct KernelContext {
    session_id: String,
    encounters: Mutex<BTreeMap<EncounterId, CombatState>>,
    events: EventBus,
    clock: SimClock,
    store: Store,
}

impl KernelContext {
    /// Construct a fresh session context over the given backend.
    #[must_use]
    pub fn new(session_id: impl Into<String>, store: Store, clock: SimClock) -> Self {
        Self {
            session_id: session_id.into(),
            encounters: Mutex::new(BTreeMap::new()),
            events: EventBus::default(),
            clock,
            store,
        }
    }

    /// This session's opaque identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// The event bus subscribers are registered against and events are published on.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// The deterministic simulation clock backing audit timestamps.
    #[must_use]
    pub const fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// The storage backend.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Run `handler` through the audit wrapper: records `{action, arguments}`
    /// before dispatch and `{result|error, durationMs, timestamp}` on return,
    /// using this session's clock and store. The handler's own outcome is
    /// always returned unchanged, per spec.md §7's propagation rule.
    pub async fn record<F, Fut, T>(
        &self,
        action: &str,
        arguments: serde_json::Value,
        request_id: Option<String>,
        handler: F,
    ) -> Result<T, KernelError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, KernelError>>,
        T: serde::Serialize,
    {
        rpgkernel_events::record_call(&self.store, &self.clock, action, arguments, request_id, handler).await
    }

    /// Register a live encounter in this session's in-memory registry.
    pub fn insert_encounter(&self, state: CombatState) {
        let mut encounters = self.encounters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        encounters.insert(state.id, state);
    }

    /// Fetch a clone of a live encounter from this session's registry.
    ///
    /// # Errors
    /// Returns [`KernelError::NotFound`] if no encounter with `id` is registered.
    pub fn get_encounter(&self, id: EncounterId) -> Result<CombatState, KernelError> {
        let encounters = self.encounters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        encounters
            .get(&id)
            .cloned()
            .ok_or_else(|| KernelError::NotFound(format!("no encounter {id} in session {}", self.session_id)))
    }

    /// Replace a live encounter's state in this session's registry.
    pub fn put_encounter(&self, state: CombatState) {
        let mut encounters = self.encounters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        encounters.insert(state.id, state);
    }

    /// Remove a live encounter from this session's registry (after `endEncounter`).
    pub fn remove_encounter(&self, id: EncounterId) {
        let mut encounters = self.encounters.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        encounters.remove(&id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn world_round_trips_through_the_in_memory_store() {
        let store = Store::in_memory();
        let world = World {
            id: WorldId::new(),
            name: "Test".to_owned(),
            seed: "s".to_owned(),
            width: 10,
            height: 10,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            environment: None,
        };
        store.create_world(&world).await.expect("create");
        let fetched = store.get_world(world.id).await.expect("get");
        assert_eq!(fetched, world);
    }

    #[test]
    fn encounter_registry_is_namespaced_per_context() {
        let store = Store::in_memory();
        let context = KernelContext::new("session-a", store, SimClock::new(Utc::now()));
        let id = EncounterId::new();
        assert!(context.get_encounter(id).is_err());
    }
}
