//! World generation orchestration: wires heightmap → climate → biome →
//! rivers → regions → structures into one deterministic pipeline.
//!
//! Tile-grid indices are taken from `enumerate()` over the same grids they
//! index into, so they're always in bounds.
#![allow(clippy::indexing_slicing, clippy::arithmetic_side_effects, clippy::cast_precision_loss)]

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rpgkernel_dice::DeterministicRng;
use rpgkernel_types::{Biome, Region, RiverSegment, Structure, Tile, World, WorldId};
use serde::{Deserialize, Serialize};

use crate::biome::resolve_biome;
use crate::climate::{compute_moisture, compute_temperature};
use crate::error::WorldGenError;
use crate::heightmap::generate_heightmap;
use crate::regions::generate_regions;
use crate::rivers::generate_rivers;
use crate::structures::generate_structures;

/// Tunable world-generation parameters, per `spec.md` §4.B.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldGenConfig {
    /// Number of Perlin octaves layered into the heightmap.
    pub octaves: u32,
    /// Amplitude falloff per octave.
    pub persistence: f64,
    /// Frequency growth per octave.
    pub lacunarity: f64,
    /// Target fraction of tiles at or above sea level.
    pub land_ratio: f64,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            land_ratio: 0.45,
        }
    }
}

/// Summary of a completed generation run, satisfying the `world.generate`
/// tool contract's output fields (a SPEC_FULL supplement over the bare
/// `World` record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldGenReport {
    /// Count of tiles per biome.
    pub biome_distribution: BTreeMap<String, u32>,
    /// Mean elevation across all tiles.
    pub mean_elevation: f64,
    /// Number of river segments with flux over the visibility threshold.
    pub river_count: usize,
    /// Number of structures placed.
    pub structure_count: usize,
}

/// The full output of one `generate_world` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedWorld {
    /// The world record.
    pub world: World,
    /// Every tile, in row-major order.
    pub tiles: Vec<Tile>,
    /// Segmented regions.
    pub regions: Vec<Region>,
    /// River DAG edges.
    pub rivers: Vec<RiverSegment>,
    /// Placed structures.
    pub structures: Vec<Structure>,
    /// Summary statistics.
    pub report: WorldGenReport,
}

/// Generate a complete world: heightmap, climate, biomes, rivers, regions,
/// and structures, all derived deterministically from `seed`.
///
/// # Errors
/// Returns [`WorldGenError`] if `width`/`height`/`seed`/`config` are invalid.
pub fn generate_world(
    name: &str,
    seed: &str,
    width: u32,
    height: u32,
    config: &WorldGenConfig,
    created_at: DateTime<Utc>,
) -> Result<GeneratedWorld, WorldGenError> {
    let world_id = WorldId::new();
    let elevation = generate_heightmap(width, height, seed, config)?;
    let temperature = compute_temperature(&elevation);
    let moisture = compute_moisture(&elevation);

    let biome_grid: Vec<Vec<Biome>> = elevation
        .iter()
        .zip(temperature.iter())
        .zip(moisture.iter())
        .map(|((e_row, t_row), m_row)| {
            e_row
                .iter()
                .zip(t_row.iter())
                .zip(m_row.iter())
                .map(|((&e, &t), &m)| resolve_biome(e, t, m))
                .collect::<Vec<_>>()
        })
        .collect();

    let mut tiles = Vec::new();
    for (y, row) in biome_grid.iter().enumerate() {
        for (x, &tile_biome) in row.iter().enumerate() {
            let xi = i32::try_from(x).unwrap_or(0);
            let yi = i32::try_from(y).unwrap_or(0);
            #[allow(clippy::indexing_slicing)]
            let tile_elevation = elevation[y][x];
            #[allow(clippy::indexing_slicing)]
            let tile_temperature = temperature[y][x];
            #[allow(clippy::indexing_slicing)]
            let tile_moisture = moisture[y][x];
            tiles.push(Tile {
                world_id,
                x: xi,
                y: yi,
                biome: tile_biome,
                elevation: tile_elevation,
                moisture: tile_moisture,
                temperature: tile_temperature,
            });
        }
    }

    let mut rng = DeterministicRng::from_seed(seed);
    let rivers = generate_rivers(world_id, &elevation);
    let regions = generate_regions(world_id, &biome_grid, &elevation, &mut rng);
    let structures = generate_structures(world_id, &biome_grid, &rivers, &mut rng);

    let mut biome_distribution: BTreeMap<String, u32> = BTreeMap::new();
    for tile in &tiles {
        *biome_distribution.entry(format!("{:?}", tile.biome)).or_insert(0) += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let mean_elevation = if tiles.is_empty() {
        0.0
    } else {
        tiles.iter().map(|t| f64::from(t.elevation)).sum::<f64>() / tiles.len() as f64
    };

    let world = World {
        id: world_id,
        name: name.to_owned(),
        seed: seed.to_owned(),
        width,
        height,
        created_at,
        updated_at: created_at,
        environment: None,
    };

    let report = WorldGenReport {
        biome_distribution,
        mean_elevation,
        river_count: rivers.len(),
        structure_count: structures.len(),
    };

    Ok(GeneratedWorld {
        world,
        tiles,
        regions,
        rivers,
        structures,
        report,
    })
}
