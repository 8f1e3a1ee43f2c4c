//! Contiguous-tile segmentation into named [`Region`]s.
//!
//! Every land tile is first classified into a [`RegionType`] from its
//! biome/elevation, then 4-connected flood fill groups same-typed tiles
//! into one region each, the same "classify, then connected-component"
//! shape `rpgkernel_world::structures` uses for habitability scoring.
//!
//! Grid indices are resolved through `get`/`get_mut` during the flood fill
//! itself; the few direct `[]` uses are test fixtures already known to be
//! in bounds. Coordinate/centroid arithmetic is bounded by the heightmap's
//! own dimensions.
#![allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::collections::VecDeque;

use rand::Rng;
use rpgkernel_dice::DeterministicRng;
use rpgkernel_types::{Biome, Region, RegionId, RegionType, WorldId};

const HIGHLAND_ELEVATION: i32 = 75;

const NAME_PREFIXES: [&str; 12] = [
    "North", "South", "East", "West", "Upper", "Lower", "Old", "High", "Deep", "Far", "Lost",
    "Shattered",
];

const NAME_ROOTS: [&str; 12] = [
    "Reach", "Hollow", "March", "Vale", "Fen", "Downs", "Barrens", "Expanse", "Shelf", "Cradle",
    "Span", "Hold",
];

const fn classify(biome: Biome, elevation: i32) -> RegionType {
    if matches!(biome, Biome::Ocean) {
        return RegionType::Waterbody;
    }
    if elevation >= HIGHLAND_ELEVATION {
        return RegionType::Highlands;
    }
    match biome {
        Biome::Plains | Biome::Beach | Biome::Woodland | Biome::Savanna | Biome::Forest => {
            RegionType::Kingdom
        }
        _ => RegionType::Wilderness,
    }
}

fn region_color(region_type: RegionType, index: usize) -> String {
    let base = match region_type {
        RegionType::Kingdom => 0x00_B0_60,
        RegionType::Wilderness => 0x4C_7A_2E,
        RegionType::Waterbody => 0x1E_6F_B8,
        RegionType::Highlands => 0x8A_6D_4B,
    };
    #[allow(clippy::cast_possible_truncation)]
    let shift = (index % 5) as u32 * 4;
    format!("#{:06X}", base ^ (0x01_01_01_u32.wrapping_shl(shift) & 0x0F_0F_0F))
}

/// Segment a biome/elevation grid into named, typed regions.
#[must_use]
pub fn generate_regions(
    world_id: WorldId,
    biome: &[Vec<Biome>],
    elevation: &[Vec<i32>],
    rng: &mut DeterministicRng,
) -> Vec<Region> {
    let height = biome.len();
    let width = biome.first().map_or(0, Vec::len);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mut visited = vec![vec![false; width]; height];
    let mut regions = Vec::new();
    let mut name_rng = rng.fork("region-names");

    for y in 0..height {
        for x in 0..width {
            if visited.get(y).and_then(|row| row.get(x)).copied().unwrap_or(true) {
                continue;
            }
            let Some(tile_biome) = biome.get(y).and_then(|row| row.get(x)).copied() else {
                continue;
            };
            let tile_elevation = elevation.get(y).and_then(|row| row.get(x)).copied().unwrap_or(0);
            let region_type = classify(tile_biome, tile_elevation);

            let mut members = Vec::new();
            let mut queue = VecDeque::new();
            queue.push_back((x, y));
            if let Some(cell) = visited.get_mut(y).and_then(|row| row.get_mut(x)) {
                *cell = true;
            }

            while let Some((cx, cy)) = queue.pop_front() {
                members.push((cx, cy));
                for (dx, dy) in [(-1_i32, 0_i32), (1, 0), (0, -1), (0, 1)] {
                    let Some(nx) = cx.checked_add_signed(dx as isize) else {
                        continue;
                    };
                    let Some(ny) = cy.checked_add_signed(dy as isize) else {
                        continue;
                    };
                    if nx >= width || ny >= height {
                        continue;
                    }
                    let already = visited.get(ny).and_then(|row| row.get(nx)).copied().unwrap_or(true);
                    if already {
                        continue;
                    }
                    let neighbor_biome = biome.get(ny).and_then(|row| row.get(nx)).copied();
                    let neighbor_elevation = elevation.get(ny).and_then(|row| row.get(nx)).copied().unwrap_or(0);
                    if neighbor_biome.map(|b| classify(b, neighbor_elevation)) != Some(region_type) {
                        continue;
                    }
                    if let Some(cell) = visited.get_mut(ny).and_then(|row| row.get_mut(nx)) {
                        *cell = true;
                    }
                    queue.push_back((nx, ny));
                }
            }

            let count = members.len().max(1);
            let sum_x: usize = members.iter().map(|&(mx, _)| mx).sum();
            let sum_y: usize = members.iter().map(|&(_, my)| my).sum();
            #[allow(clippy::cast_possible_wrap)]
            let center_x = (sum_x / count) as i32;
            #[allow(clippy::cast_possible_wrap)]
            let center_y = (sum_y / count) as i32;

            let prefix_idx = name_rng.inner_mut().random_range(0..NAME_PREFIXES.len());
            let root_idx = name_rng.inner_mut().random_range(0..NAME_ROOTS.len());
            let name = format!(
                "{} {}",
                NAME_PREFIXES.get(prefix_idx).unwrap_or(&"Unnamed"),
                NAME_ROOTS.get(root_idx).unwrap_or(&"Reach")
            );

            regions.push(Region {
                id: RegionId::new(),
                world_id,
                name,
                region_type,
                center_x,
                center_y,
                color: region_color(region_type, regions.len()),
            });
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_grid_yields_no_regions() {
        let regions = generate_regions(WorldId::new(), &[], &[], &mut DeterministicRng::from_seed("r"));
        assert!(regions.is_empty());
    }

    #[test]
    fn uniform_ocean_grid_is_one_waterbody_region() {
        let biome = vec![vec![Biome::Ocean; 4]; 4];
        let elevation = vec![vec![10; 4]; 4];
        let mut rng = DeterministicRng::from_seed("r2");
        let regions = generate_regions(WorldId::new(), &biome, &elevation, &mut rng);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].region_type, RegionType::Waterbody);
    }

    #[test]
    fn two_disjoint_biomes_yield_two_regions() {
        let biome = vec![vec![Biome::Plains, Biome::Plains, Biome::Desert, Biome::Desert]];
        let elevation = vec![vec![50, 50, 50, 50]];
        let mut rng = DeterministicRng::from_seed("r3");
        let regions = generate_regions(WorldId::new(), &biome, &elevation, &mut rng);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn region_generation_is_deterministic() {
        let biome = vec![vec![Biome::Plains, Biome::Forest, Biome::Desert]];
        let elevation = vec![vec![50, 50, 50]];
        let mut rng_a = DeterministicRng::from_seed("r4");
        let mut rng_b = DeterministicRng::from_seed("r4");
        let a = generate_regions(WorldId::new(), &biome, &elevation, &mut rng_a);
        let b = generate_regions(WorldId::new(), &biome, &elevation, &mut rng_b);
        let names_a: Vec<_> = a.iter().map(|r| r.name.clone()).collect();
        let names_b: Vec<_> = b.iter().map(|r| r.name.clone()).collect();
        assert_eq!(names_a, names_b);
    }
}
