//! Operations on the `characters` table.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rpgkernel_types::{AbilityScores, Character, CharacterId, SpellSlotPool};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::DbError;

/// Typed access to character records, backed by either Postgres or memory.
pub trait CharacterRepository {
    /// Insert a newly defined character.
    ///
    /// # Errors
    /// Returns [`DbError::Postgres`] (Postgres backend only) if the insert fails.
    async fn create(&self, character: &Character) -> Result<(), DbError>;

    /// Fetch a character by id.
    ///
    /// # Errors
    /// Returns [`DbError::NotFound`] if no character with `id` exists.
    async fn get(&self, id: CharacterId) -> Result<Character, DbError>;

    /// Persist changes to a character (hp, resources, etc).
    ///
    /// # Errors
    /// Returns [`DbError::NotFound`] if no character with `character.id` exists.
    async fn update(&self, character: &Character) -> Result<(), DbError>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct CharacterRow {
    id: uuid::Uuid,
    name: String,
    stats: Json<AbilityScores>,
    level: i32,
    hp: i32,
    max_hp: i32,
    ac: i32,
    proficiencies: Json<Vec<String>>,
    save_proficiencies: Json<Vec<rpgkernel_types::Ability>>,
    spell_slots: Json<BTreeMap<u32, SpellSlotPool>>,
    resistances: Json<Vec<rpgkernel_types::DamageType>>,
    vulnerabilities: Json<Vec<rpgkernel_types::DamageType>>,
    immunities: Json<Vec<rpgkernel_types::DamageType>>,
}

impl TryFrom<CharacterRow> for Character {
    type Error = DbError;

    fn try_from(row: CharacterRow) -> Result<Self, DbError> {
        Ok(Self {
            id: CharacterId::from(row.id),
            name: row.name,
            stats: row.stats.0,
            level: u32::try_from(row.level).map_err(|e| DbError::MalformedRow { table: "characters", reason: e.to_string() })?,
            hp: row.hp,
            max_hp: row.max_hp,
            ac: row.ac,
            proficiencies: row.proficiencies.0.into_iter().collect(),
            save_proficiencies: row.save_proficiencies.0.into_iter().collect(),
            spell_slots: row.spell_slots.0,
            resistances: row.resistances.0.into_iter().collect(),
            vulnerabilities: row.vulnerabilities.0.into_iter().collect(),
            immunities: row.immunities.0.into_iter().collect(),
        })
    }
}

/// Postgres-backed character repository.
pub struct PgCharacterRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PgCharacterRepository<'a> {
    /// Bind a repository to a connection pool.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CharacterRepository for PgCharacterRepository<'_> {
    async fn create(&self, character: &Character) -> Result<(), DbError> {
        let proficiencies: Vec<&String> = character.proficiencies.iter().collect();
        sqlx::query(
            "INSERT INTO characters
               (id, name, stats, level, hp, max_hp, ac, proficiencies, save_proficiencies,
                spell_slots, resistances, vulnerabilities, immunities)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(character.id.into_inner())
        .bind(&character.name)
        .bind(Json(&character.stats))
        .bind(i32::try_from(character.level).unwrap_or(i32::MAX))
        .bind(character.hp)
        .bind(character.max_hp)
        .bind(character.ac)
        .bind(Json(proficiencies))
        .bind(Json(&character.save_proficiencies))
        .bind(Json(&character.spell_slots))
        .bind(Json(&character.resistances))
        .bind(Json(&character.vulnerabilities))
        .bind(Json(&character.immunities))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: CharacterId) -> Result<Character, DbError> {
        let row = sqlx::query_as::<_, CharacterRow>("SELECT * FROM characters WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound { entity: "character", id: id.to_string() })?;
        row.try_into()
    }

    async fn update(&self, character: &Character) -> Result<(), DbError> {
        let proficiencies: Vec<&String> = character.proficiencies.iter().collect();
        let result = sqlx::query(
            "UPDATE characters SET name = $2, stats = $3, level = $4, hp = $5, max_hp = $6,
               ac = $7, proficiencies = $8, save_proficiencies = $9, spell_slots = $10,
               resistances = $11, vulnerabilities = $12, immunities = $13
             WHERE id = $1",
        )
        .bind(character.id.into_inner())
        .bind(&character.name)
        .bind(Json(&character.stats))
        .bind(i32::try_from(character.level).unwrap_or(i32::MAX))
        .bind(character.hp)
        .bind(character.max_hp)
        .bind(character.ac)
        .bind(Json(proficiencies))
        .bind(Json(&character.save_proficiencies))
        .bind(Json(&character.spell_slots))
        .bind(Json(&character.resistances))
        .bind(Json(&character.vulnerabilities))
        .bind(Json(&character.immunities))
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound { entity: "character", id: character.id.to_string() });
        }
        Ok(())
    }
}

/// In-memory character repository, used when `NODE_ENV=test`.
#[derive(Default)]
pub struct InMemoryCharacterRepository {
    rows: Mutex<BTreeMap<CharacterId, Character>>,
}

impl CharacterRepository for InMemoryCharacterRepository {
    async fn create(&self, character: &Character) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.insert(character.id, character.clone());
        Ok(())
    }

    async fn get(&self, id: CharacterId) -> Result<Character, DbError> {
        let rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        rows.get(&id).cloned().ok_or_else(|| DbError::NotFound { entity: "character", id: id.to_string() })
    }

    async fn update(&self, character: &Character) -> Result<(), DbError> {
        let mut rows = self.rows.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if !rows.contains_key(&character.id) {
            return Err(DbError::NotFound { entity: "character", id: character.id.to_string() });
        }
        rows.insert(character.id, character.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpgkernel_types::Ability;

    fn make_character() -> Character {
        Character {
            id: CharacterId::new(),
            name: "Rook".to_owned(),
            stats: AbilityScores { str_: 16, dex: 14, con: 15, int: 10, wis: 12, cha: 8 },
            level: 3,
            hp: 28,
            max_hp: 28,
            ac: 16,
            proficiencies: ["athletics".to_owned()].into_iter().collect(),
            save_proficiencies: [Ability::Str, Ability::Con].into_iter().collect(),
            spell_slots: BTreeMap::new(),
            resistances: [].into_iter().collect(),
            vulnerabilities: [].into_iter().collect(),
            immunities: [].into_iter().collect(),
        }
    }

    #[tokio::test]
    async fn in_memory_roundtrips_a_character() {
        let repo = InMemoryCharacterRepository::default();
        let character = make_character();
        repo.create(&character).await.expect("create");
        let fetched = repo.get(character.id).await.expect("get");
        assert_eq!(fetched, character);
    }

    #[tokio::test]
    async fn in_memory_update_applies_damage() {
        let repo = InMemoryCharacterRepository::default();
        let character = make_character();
        repo.create(&character).await.expect("create");
        let mut damaged = character.clone();
        damaged.hp = 10;
        repo.update(&damaged).await.expect("update");
        assert_eq!(repo.get(character.id).await.expect("get").hp, 10);
    }

    #[tokio::test]
    async fn in_memory_get_missing_character_fails() {
        let repo = InMemoryCharacterRepository::default();
        assert!(repo.get(CharacterId::new()).await.is_err());
    }
}
