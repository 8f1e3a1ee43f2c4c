//! Area-of-effect geometry: sphere, cube, cone, and line shapes.
//!
//! Shape extents are bounded by `length`/`size`/`radius` arguments callers
//! already derive from spell data (tens of tiles at most), so the loop
//! index arithmetic below can't realistically overflow; allowed rather than
//! threading `saturating_*` through every range bound.
#![allow(clippy::arithmetic_side_effects)]

use rpgkernel_types::Position;

use crate::grid::chebyshev_distance;

/// An area-of-effect template anchored at an origin, per `spec.md`'s
/// spatial module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaOfEffect {
    /// All cells within `radius` tiles of `origin` (Chebyshev distance).
    Sphere {
        /// Anchor cell.
        origin: Position,
        /// Radius in tiles.
        radius: u32,
    },
    /// An axis-aligned square of `size` tiles per side, anchored at its
    /// minimum corner.
    Cube {
        /// Minimum corner.
        origin: Position,
        /// Side length in tiles.
        size: u32,
    },
    /// A cone from `origin` toward `direction`, spreading to `length` tiles
    /// with a 90-degree half-angle measured from the facing direction.
    Cone {
        /// Anchor cell (the point of the cone).
        origin: Position,
        /// Unit-ish facing direction (need not be normalized; only its
        /// sign/ratio matters for the angle test).
        direction: (i32, i32),
        /// Cone length in tiles.
        length: u32,
    },
    /// A straight line from `origin` to `end`, `width` tiles wide.
    Line {
        /// Start cell.
        origin: Position,
        /// End cell.
        end: Position,
        /// Perpendicular width in tiles.
        width: u32,
    },
}

impl AreaOfEffect {
    /// All grid cells this area covers, including the origin where
    /// geometrically appropriate.
    #[must_use]
    pub fn cells(&self) -> Vec<Position> {
        match *self {
            Self::Sphere { origin, radius } => sphere_cells(origin, radius),
            Self::Cube { origin, size } => cube_cells(origin, size),
            Self::Cone {
                origin,
                direction,
                length,
            } => cone_cells(origin, direction, length),
            Self::Line { origin, end, width } => line_cells(origin, end, width),
        }
    }

    /// Whether `position` falls within this area.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        self.cells().contains(&position)
    }
}

fn sphere_cells(origin: Position, radius: u32) -> Vec<Position> {
    let r = i32::try_from(radius).unwrap_or(i32::MAX);
    let mut cells = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            let candidate = Position {
                x: origin.x.saturating_add(dx),
                y: origin.y.saturating_add(dy),
            };
            if chebyshev_distance((origin.x, origin.y), (candidate.x, candidate.y)) <= radius {
                cells.push(candidate);
            }
        }
    }
    cells
}

fn cube_cells(origin: Position, size: u32) -> Vec<Position> {
    let s = i32::try_from(size).unwrap_or(i32::MAX);
    let mut cells = Vec::new();
    for dy in 0..s {
        for dx in 0..s {
            cells.push(Position {
                x: origin.x.saturating_add(dx),
                y: origin.y.saturating_add(dy),
            });
        }
    }
    cells
}

fn cone_cells(origin: Position, direction: (i32, i32), length: u32) -> Vec<Position> {
    let l = i32::try_from(length).unwrap_or(i32::MAX);
    let (dir_x, dir_y) = direction;
    let dir_len = f64::from(dir_x.saturating_mul(dir_x).saturating_add(dir_y.saturating_mul(dir_y)))
        .sqrt()
        .max(f64::EPSILON);

    let mut cells = Vec::new();
    for dy in -l..=l {
        for dx in -l..=l {
            if dx == 0 && dy == 0 {
                continue;
            }
            let dist = chebyshev_distance((0, 0), (dx, dy));
            if dist == 0 || dist > length {
                continue;
            }
            let cand_len = f64::from(dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy)))
                .sqrt()
                .max(f64::EPSILON);
            let dot = f64::from(dx.saturating_mul(dir_x).saturating_add(dy.saturating_mul(dir_y)));
            let cos_angle = dot / (cand_len * dir_len);
            // 90-degree half-angle cone: anything within a right angle of
            // the facing direction is included.
            if cos_angle >= 0.0 {
                cells.push(Position {
                    x: origin.x.saturating_add(dx),
                    y: origin.y.saturating_add(dy),
                });
            }
        }
    }
    cells
}

fn line_cells(origin: Position, end: Position, width: u32) -> Vec<Position> {
    let traced = crate::los::line_cells(origin, end);
    if width <= 1 {
        let mut cells = vec![origin];
        cells.extend(traced);
        return cells;
    }

    let half = i32::try_from(width / 2).unwrap_or(i32::MAX);
    let mut spine = vec![origin];
    spine.extend(traced);

    let mut cells = std::collections::BTreeSet::new();
    for p in spine {
        for dy in -half..=half {
            for dx in -half..=half {
                cells.insert(Position {
                    x: p.x.saturating_add(dx),
                    y: p.y.saturating_add(dy),
                });
            }
        }
    }
    cells.into_iter().collect()
}
