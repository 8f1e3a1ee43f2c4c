//! The mutable map state a patch script is applied against.
// Casts below are guarded by an immediately-preceding `>= 0` check.
#![allow(clippy::cast_sign_loss)]

use std::collections::{BTreeMap, BTreeSet};

use rpgkernel_types::{Structure, Tile, WorldId};

/// A free-form text annotation anchored to a grid point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Grid x coordinate.
    pub x: i32,
    /// Grid y coordinate.
    pub y: i32,
    /// Annotation text.
    pub text: String,
}

/// The patchable view of one world: its tile grid, structures, road
/// overlay, and annotations. Commands mutate this; the kernel is
/// responsible for loading one from persistence and writing it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchTarget {
    /// The world this target belongs to.
    pub world_id: WorldId,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Tiles keyed by `(x, y)`.
    pub tiles: BTreeMap<(i32, i32), Tile>,
    /// Placed structures.
    pub structures: Vec<Structure>,
    /// Cells marked as road.
    pub roads: BTreeSet<(i32, i32)>,
    /// Free-form annotations.
    pub annotations: Vec<Annotation>,
}

impl PatchTarget {
    /// Whether `(x, y)` lies within `[0, width) x [0, height)`.
    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_coordinates_are_out_of_bounds() {
        let target = PatchTarget {
            world_id: WorldId::new(),
            width: 10,
            height: 10,
            tiles: BTreeMap::new(),
            structures: Vec::new(),
            roads: BTreeSet::new(),
            annotations: Vec::new(),
        };
        assert!(!target.in_bounds(-1, 0));
        assert!(target.in_bounds(0, 0));
        assert!(target.in_bounds(9, 9));
        assert!(!target.in_bounds(10, 0));
    }
}
