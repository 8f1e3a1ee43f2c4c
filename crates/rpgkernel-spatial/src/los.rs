//! Bresenham line-of-sight tracing.
//!
//! Coordinates here are always differences between two in-bounds grid
//! positions, so the classic Bresenham error-term arithmetic cannot
//! overflow in practice; allowed below rather than threading
//! `saturating_*` through a textbook algorithm.
#![allow(clippy::arithmetic_side_effects)]

use rpgkernel_types::Position;

/// Cells on the line from `from` to `to`, via Bresenham's algorithm,
/// excluding `from` itself.
#[must_use]
pub fn line_cells(from: Position, to: Position) -> Vec<Position> {
    let mut cells = Vec::new();

    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx: i32 = if from.x < to.x { 1 } else { -1 };
    let sy: i32 = if from.y < to.y { 1 } else { -1 };

    let mut err = dx + dy;
    let mut x = from.x;
    let mut y = from.y;

    loop {
        if (x, y) != (from.x, from.y) {
            cells.push(Position { x, y });
        }
        if x == to.x && y == to.y {
            break;
        }
        let doubled_err = err.saturating_mul(2);
        if doubled_err >= dy {
            err = err.saturating_add(dy);
            x = x.saturating_add(sx);
        }
        if doubled_err <= dx {
            err = err.saturating_add(dx);
            y = y.saturating_add(sy);
        }
    }

    cells
}

/// Whether `from` has line of sight to `to`, given a predicate reporting
/// which cells block sight. The endpoints themselves never block each
/// other's visibility.
#[must_use]
pub fn has_line_of_sight(from: Position, to: Position, blocks_sight: impl Fn(Position) -> bool) -> bool {
    line_cells(from, to)
        .iter()
        .filter(|&&cell| cell != to)
        .all(|&cell| !blocks_sight(cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_includes_all_intermediate_cells() {
        let from = Position { x: 0, y: 0 };
        let to = Position { x: 4, y: 0 };
        let cells = line_cells(from, to);
        assert_eq!(cells.last(), Some(&to));
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn diagonal_line_is_symmetric() {
        let from = Position { x: 0, y: 0 };
        let to = Position { x: 3, y: 3 };
        let forward = line_cells(from, to);
        let backward = line_cells(to, from);
        assert_eq!(forward.len(), backward.len());
    }

    #[test]
    fn obstacle_between_blocks_sight() {
        let from = Position { x: 0, y: 0 };
        let to = Position { x: 4, y: 0 };
        let blocked = has_line_of_sight(from, to, |p| p == Position { x: 2, y: 0 });
        assert!(!blocked);
    }

    #[test]
    fn clear_path_has_sight() {
        let from = Position { x: 0, y: 0 };
        let to = Position { x: 4, y: 0 };
        assert!(has_line_of_sight(from, to, |_| false));
    }

    #[test]
    fn obstacle_at_target_does_not_block_its_own_visibility() {
        let from = Position { x: 0, y: 0 };
        let to = Position { x: 2, y: 0 };
        assert!(has_line_of_sight(from, to, |p| p == to));
    }
}
