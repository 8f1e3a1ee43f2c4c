//! Temperature (latitude + elevation lapse) and moisture (ocean-distance) fields.
//!
//! Every `grid[y][x]` access below is guarded by a bounds check against that
//! same grid's dimensions immediately before the index (the BFS neighbor
//! loop) or is driven by `enumerate()` over the grid itself, so indexing
//! can't go out of bounds; allowed rather than threading `get`/`get_mut`
//! through the whole module.
#![allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)]

use std::collections::VecDeque;

use rpgkernel_types::SEA_LEVEL;

/// Elevation lapse: temperature drops this many degrees per elevation point
/// above sea level, the standard atmospheric-lapse-rate analogy.
const LAPSE_RATE_PER_ELEVATION: f64 = 0.006;

/// Moisture lost per tile of BFS distance from the nearest ocean tile.
const MOISTURE_FALLOFF_PER_TILE: i32 = 6;

/// Compute a temperature field in `[-20, 40]` from latitude (`y` distance
/// from the equatorial row) and elevation lapse.
#[must_use]
pub fn compute_temperature(elevation: &[Vec<i32>]) -> Vec<Vec<i32>> {
    let height = elevation.len();
    elevation
        .iter()
        .enumerate()
        .map(|(y, row)| {
            row.iter()
                .map(|&cell_elevation| temperature_at(y, height, cell_elevation))
                .collect()
        })
        .collect()
}

fn temperature_at(y: usize, height: usize, elevation: i32) -> i32 {
    if height == 0 {
        return 20;
    }
    #[allow(clippy::cast_precision_loss)]
    let y_f = y as f64;
    #[allow(clippy::cast_precision_loss)]
    let height_f = height.max(1) as f64;
    let equator = height_f / 2.0;
    let latitude_frac = ((y_f - equator).abs() / equator.max(1.0)).min(1.0);

    let base = 40.0 - 60.0 * latitude_frac;
    let above_sea = f64::from((elevation - SEA_LEVEL).max(0));
    let lapsed = base - above_sea * LAPSE_RATE_PER_ELEVATION * 100.0;

    #[allow(clippy::cast_possible_truncation)]
    let rounded = lapsed.round() as i32;
    rounded.clamp(-20, 40)
}

/// Compute a moisture field in `[0, 100]` via multi-source BFS distance
/// from every ocean tile: moisture falls off
/// [`MOISTURE_FALLOFF_PER_TILE`] per tile of distance.
#[must_use]
pub fn compute_moisture(elevation: &[Vec<i32>]) -> Vec<Vec<i32>> {
    let height = elevation.len();
    let width = elevation.first().map_or(0, Vec::len);
    if height == 0 || width == 0 {
        return Vec::new();
    }

    let mut distance = vec![vec![i32::MAX; width]; height];
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    for (y, row) in elevation.iter().enumerate() {
        for (x, &cell_elevation) in row.iter().enumerate() {
            if cell_elevation < SEA_LEVEL {
                distance[y][x] = 0;
                queue.push_back((x, y));
            }
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        let current = distance[y][x];
        for (dx, dy) in [(-1_i32, 0_i32), (1, 0), (0, -1), (0, 1)] {
            let Some(nx) = x.checked_add_signed(dx as isize) else {
                continue;
            };
            let Some(ny) = y.checked_add_signed(dy as isize) else {
                continue;
            };
            if nx >= width || ny >= height {
                continue;
            }
            if distance[ny][nx] > current.saturating_add(1) {
                distance[ny][nx] = current.saturating_add(1);
                queue.push_back((nx, ny));
            }
        }
    }

    distance
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|d| {
                    let capped = if d == i32::MAX { 100 } else { d };
                    (100 - capped.saturating_mul(MOISTURE_FALLOFF_PER_TILE)).clamp(0, 100)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equator_is_warmer_than_poles_at_same_elevation() {
        let mut elevation = vec![vec![50; 10]; 20];
        for row in &mut elevation {
            row.fill(50);
        }
        let temps = compute_temperature(&elevation);
        let equator_temp = temps[10][0];
        let pole_temp = temps[0][0];
        assert!(equator_temp > pole_temp);
    }

    #[test]
    fn higher_elevation_is_colder() {
        let elevation = vec![vec![21, 90]];
        let temps = compute_temperature(&elevation);
        assert!(temps[0][0] > temps[0][1]);
    }

    #[test]
    fn ocean_tiles_are_fully_moist() {
        let elevation = vec![vec![10, 50, 50]];
        let moisture = compute_moisture(&elevation);
        assert_eq!(moisture[0][0], 100);
    }

    #[test]
    fn moisture_decreases_with_distance_from_ocean() {
        let elevation = vec![vec![10, 50, 50, 50, 50, 50]];
        let moisture = compute_moisture(&elevation);
        assert!(moisture[0][1] >= moisture[0][5]);
    }

    #[test]
    fn fully_landlocked_grid_does_not_panic() {
        let elevation = vec![vec![50; 4]; 4];
        let moisture = compute_moisture(&elevation);
        assert_eq!(moisture.len(), 4);
    }
}
