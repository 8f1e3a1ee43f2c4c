//! Steepest-descent river routing: a DAG of tiles flowing strictly downhill,
//! with accumulated flux determining which edges become visible rivers.
//!
//! Grid indices throughout are bounded by the input heightmap's own
//! dimensions (checked in `elevation_at`, or taken from `enumerate()`), so
//! direct indexing and the coordinate arithmetic around it can't overflow
//! or go out of bounds; allowed rather than threading bounds plumbing
//! through a terrain-routing algorithm.
#![allow(
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation
)]

use rpgkernel_types::{RiverSegment, RiverSegmentId, SEA_LEVEL, WorldId};

/// Minimum accumulated flux for a downhill edge to be emitted as a river segment.
const RIVER_FLUX_THRESHOLD: u32 = 4;

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Generate river segments for a heightmap, per `spec.md` §4.B's river module.
#[must_use]
pub fn generate_rivers(world_id: WorldId, elevation: &[Vec<i32>]) -> Vec<RiverSegment> {
    let height = elevation.len();
    let width = elevation.first().map_or(0, Vec::len);
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let elevation_at = |x: i32, y: i32| -> Option<i32> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        elevation.get(y)?.get(x).copied()
    };

    let mut land_tiles: Vec<(i32, i32, i32)> = Vec::new();
    for (y, row) in elevation.iter().enumerate() {
        for (x, &e) in row.iter().enumerate() {
            if e >= SEA_LEVEL {
                let xi = i32::try_from(x).unwrap_or(0);
                let yi = i32::try_from(y).unwrap_or(0);
                land_tiles.push((xi, yi, e));
            }
        }
    }

    // Steepest-descent flow target per tile, ties broken lexicographically
    // by neighbor coordinate for determinism.
    let mut flow_to: std::collections::BTreeMap<(i32, i32), (i32, i32)> = std::collections::BTreeMap::new();
    for &(x, y, e) in &land_tiles {
        let mut best: Option<(i32, (i32, i32))> = None;
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let (nx, ny) = (x + dx, y + dy);
            if let Some(ne) = elevation_at(nx, ny) {
                if ne < e {
                    match best {
                        Some((best_e, best_pos)) if (ne, (nx, ny)) >= (best_e, best_pos) => {}
                        _ => best = Some((ne, (nx, ny))),
                    }
                }
            }
        }
        if let Some((_, target)) = best {
            flow_to.insert((x, y), target);
        }
    }

    // Accumulate flux from highest to lowest elevation so every tile's flux
    // is final before it contributes to its downstream neighbor.
    let mut ordered = land_tiles.clone();
    ordered.sort_by(|a, b| b.2.cmp(&a.2).then(b.0.cmp(&a.0)).then(b.1.cmp(&a.1)));

    let mut flux: std::collections::BTreeMap<(i32, i32), u32> =
        land_tiles.iter().map(|&(x, y, _)| ((x, y), 1)).collect();

    let mut segments = Vec::new();
    for &(x, y, _) in &ordered {
        let Some(&target) = flow_to.get(&(x, y)) else {
            continue;
        };
        let source_flux = flux.get(&(x, y)).copied().unwrap_or(1);
        if let Some(target_flux) = flux.get_mut(&target) {
            *target_flux = target_flux.saturating_add(source_flux);
        }
        if source_flux >= RIVER_FLUX_THRESHOLD {
            segments.push(RiverSegment {
                id: RiverSegmentId::new(),
                world_id,
                from_x: x,
                from_y: y,
                to_x: target.0,
                to_y: target.1,
                flux: source_flux,
            });
        }
    }

    segments
}
