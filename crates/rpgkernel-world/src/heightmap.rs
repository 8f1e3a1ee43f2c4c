//! Layered Perlin-noise heightmap generation with land-ratio normalization.
//!
//! Grid coordinates and octave counts are bounded by caller-supplied world
//! dimensions (at most a few thousand tiles per side in practice), so the
//! float/int conversions below can't meaningfully lose precision; allowed
//! rather than threading `try_from`/`round` plumbing through noise sampling.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::arithmetic_side_effects
)]

use noise::{NoiseFn, Perlin};

use crate::error::WorldGenError;
use crate::generator::WorldGenConfig;

/// Derive a 32-bit noise seed from a namespace string, the same
/// domain-separated-hash approach `rpgkernel_dice::DeterministicRng` uses
/// for its PRNG streams, so heightmap octaves fork deterministically off
/// the world seed without depending on the dice crate's RNG type.
fn noise_seed(namespace: &str) -> u32 {
    let hash = blake3::hash(namespace.as_bytes());
    let bytes = hash.as_bytes();
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Raw, unnormalized layered-noise sample in roughly `[-1.0, 1.0]`.
fn sample_octaves(seed: &str, octaves: u32, persistence: f64, lacunarity: f64, x: f64, y: f64) -> f64 {
    let mut total = 0.0_f64;
    let mut amplitude = 1.0_f64;
    let mut frequency = 1.0_f64;
    let mut max_amplitude = 0.0_f64;

    for octave in 0..octaves {
        let perlin = Perlin::new(noise_seed(&format!("{seed}-heightmap-{octave}")));
        total += perlin.get([x * frequency * 0.05, y * frequency * 0.05]) * amplitude;
        max_amplitude += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    if max_amplitude > 0.0 {
        total / max_amplitude
    } else {
        0.0
    }
}

/// Generate a `width` x `height` integer elevation grid in `[0, 100]`,
/// indexed `grid[y][x]`, normalized so that exactly `config.land_ratio` of
/// tiles fall at or above [`rpgkernel_types::SEA_LEVEL`].
///
/// # Errors
/// Returns [`WorldGenError`] if dimensions or `land_ratio` are invalid.
pub fn generate_heightmap(
    width: u32,
    height: u32,
    seed: &str,
    config: &WorldGenConfig,
) -> Result<Vec<Vec<i32>>, WorldGenError> {
    if width == 0 || height == 0 {
        return Err(WorldGenError::InvalidDimensions { width, height });
    }
    if seed.trim().is_empty() {
        return Err(WorldGenError::EmptySeed);
    }
    if !(config.land_ratio > 0.0 && config.land_ratio < 1.0) {
        return Err(WorldGenError::InvalidLandRatio(config.land_ratio.to_string()));
    }

    let mut raw = vec![vec![0.0_f64; width as usize]; height as usize];
    for (y, row) in raw.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = sample_octaves(
                seed,
                config.octaves,
                config.persistence,
                config.lacunarity,
                x as f64,
                y as f64,
            );
        }
    }

    let mut sorted: Vec<f64> = raw.iter().flatten().copied().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let total = sorted.len();
    let sea_index = ((1.0 - config.land_ratio) * total as f64) as usize;
    let sea_index = sea_index.min(total.saturating_sub(1));
    let sea_threshold = sorted.get(sea_index).copied().unwrap_or(0.0);

    let min = sorted.first().copied().unwrap_or(-1.0);
    let max = sorted.last().copied().unwrap_or(1.0);

    let elevation: Vec<Vec<i32>> = raw
        .iter()
        .map(|row| {
            row.iter()
                .map(|&value| normalize_to_band(value, min, max, sea_threshold))
                .collect()
        })
        .collect();

    Ok(elevation)
}

/// Map a raw noise sample to `[0, 100]` such that `sea_threshold` lands
/// exactly on `SEA_LEVEL` (20): values below stretch into `[0, 20)`, values
/// above stretch into `[20, 100]`.
fn normalize_to_band(value: f64, min: f64, max: f64, sea_threshold: f64) -> i32 {
    let sea_level = f64::from(rpgkernel_types::SEA_LEVEL);
    let band = if value <= sea_threshold {
        let span = (sea_threshold - min).max(f64::EPSILON);
        sea_level * (value - min) / span
    } else {
        let span = (max - sea_threshold).max(f64::EPSILON);
        sea_level + (100.0 - sea_level) * (value - sea_threshold) / span
    };
    band.round().clamp(0.0, 100.0) as i32
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        let config = WorldGenConfig::default();
        assert!(generate_heightmap(0, 10, "seed", &config).is_err());
    }

    #[test]
    fn rejects_empty_seed() {
        let config = WorldGenConfig::default();
        assert!(generate_heightmap(10, 10, "  ", &config).is_err());
    }

    #[test]
    fn produces_requested_dimensions() {
        let config = WorldGenConfig::default();
        let grid = generate_heightmap(8, 6, "seed-a", &config).expect("valid");
        assert_eq!(grid.len(), 6);
        assert!(grid.iter().all(|row| row.len() == 8));
    }

    #[test]
    fn elevations_are_in_range() {
        let config = WorldGenConfig::default();
        let grid = generate_heightmap(20, 20, "seed-b", &config).expect("valid");
        for row in &grid {
            for &elevation in row {
                assert!((0..=100).contains(&elevation));
            }
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let config = WorldGenConfig::default();
        let a = generate_heightmap(12, 12, "repro-seed", &config).expect("valid");
        let b = generate_heightmap(12, 12, "repro-seed", &config).expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let config = WorldGenConfig::default();
        let a = generate_heightmap(12, 12, "seed-x", &config).expect("valid");
        let b = generate_heightmap(12, 12, "seed-y", &config).expect("valid");
        assert_ne!(a, b);
    }

    #[test]
    fn land_ratio_roughly_matches_target() {
        let config = WorldGenConfig {
            land_ratio: 0.3,
            ..WorldGenConfig::default()
        };
        let grid = generate_heightmap(40, 40, "land-ratio-seed", &config).expect("valid");
        let land = grid
            .iter()
            .flatten()
            .filter(|&&e| e >= rpgkernel_types::SEA_LEVEL)
            .count();
        let total = grid.iter().map(Vec::len).sum::<usize>();
        #[allow(clippy::cast_precision_loss)]
        let ratio = land as f64 / total as f64;
        assert!((ratio - 0.3).abs() < 0.1);
    }
}
