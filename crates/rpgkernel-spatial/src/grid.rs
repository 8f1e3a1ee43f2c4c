//! Grid/feet unit conversions and Chebyshev distance.

/// Feet per grid tile, the D&D 5e battle-map convention.
pub const TILE_FEET: u32 = 5;

/// Convert a distance in feet to whole tiles, rounding down.
#[must_use]
pub const fn feet_to_tiles(feet: u32) -> u32 {
    feet / TILE_FEET
}

/// Convert a distance in tiles to feet.
#[must_use]
pub const fn tiles_to_feet(tiles: u32) -> u32 {
    tiles.saturating_mul(TILE_FEET)
}

/// Chebyshev distance between two grid cells (5e diagonal movement: diagonals
/// cost the same as orthogonal steps).
#[must_use]
pub fn chebyshev_distance(from: (i32, i32), to: (i32, i32)) -> u32 {
    let dx = (from.0 - to.0).unsigned_abs();
    let dy = (from.1 - to.1).unsigned_abs();
    dx.max(dy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feet_to_tiles_rounds_down() {
        assert_eq!(feet_to_tiles(30), 6);
        assert_eq!(feet_to_tiles(27), 5);
    }

    #[test]
    fn tiles_to_feet_is_inverse_on_multiples() {
        assert_eq!(tiles_to_feet(feet_to_tiles(30)), 30);
    }

    #[test]
    fn chebyshev_treats_diagonal_as_single_step() {
        assert_eq!(chebyshev_distance((0, 0), (3, 3)), 3);
        assert_eq!(chebyshev_distance((0, 0), (3, 1)), 3);
    }
}
