//! A* pathfinding over an integer grid.
//!
//! Uses Chebyshev distance as both step cost and heuristic (admissible and
//! consistent for 8-directional movement with uniform diagonal cost) and
//! breaks ties between equal-cost frontier nodes lexicographically by
//! `(x, y)`, so the same start/goal/obstacle set always yields the same
//! path — required for replay byte-identity.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use rpgkernel_types::Position;

use crate::error::SpatialError;
use crate::grid::chebyshev_distance;

/// Neighbor offsets, in a fixed lexicographic order so ties resolve
/// deterministically regardless of iteration order elsewhere.
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frontier {
    f_score: u32,
    position: (i32, i32),
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert f_score so the lowest f_score
        // pops first, then break ties lexicographically (also inverted).
        other
            .f_score
            .cmp(&self.f_score)
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a lowest-cost path from `start` to `goal` on a grid where
/// `is_blocked` reports impassable cells and `terrain_cost` reports the
/// movement cost (in tiles) to enter a cell (`1` for normal terrain, `2`
/// for difficult terrain, per `spec.md`'s movement rules).
///
/// Returns the path including both `start` and `goal`.
///
/// # Errors
/// Returns [`SpatialError::StartBlocked`]/[`SpatialError::GoalBlocked`] if
/// either endpoint is itself blocked, or [`SpatialError::Unreachable`] if no
/// path exists.
pub fn find_path(
    start: Position,
    goal: Position,
    is_blocked: impl Fn(i32, i32) -> bool,
    terrain_cost: impl Fn(i32, i32) -> u32,
) -> Result<Vec<Position>, SpatialError> {
    if is_blocked(start.x, start.y) {
        return Err(SpatialError::StartBlocked(start));
    }
    if is_blocked(goal.x, goal.y) {
        return Err(SpatialError::GoalBlocked(goal));
    }
    if start == goal {
        return Ok(vec![start]);
    }

    let goal_xy = (goal.x, goal.y);
    let start_xy = (start.x, start.y);

    let mut open = BinaryHeap::new();
    let mut came_from: BTreeMap<(i32, i32), (i32, i32)> = BTreeMap::new();
    let mut g_score: BTreeMap<(i32, i32), u32> = BTreeMap::new();

    g_score.insert(start_xy, 0);
    open.push(Frontier {
        f_score: chebyshev_distance(start_xy, goal_xy),
        position: start_xy,
    });

    while let Some(current) = open.pop() {
        if current.position == goal_xy {
            return Ok(reconstruct_path(&came_from, start_xy, goal_xy));
        }

        let current_g = g_score.get(&current.position).copied().unwrap_or(u32::MAX);

        for (dx, dy) in NEIGHBOR_OFFSETS {
            let next = (current.position.0 + dx, current.position.1 + dy);
            if is_blocked(next.0, next.1) {
                continue;
            }
            let step_cost = terrain_cost(next.0, next.1).max(1);
            let tentative_g = current_g.saturating_add(step_cost);

            let best_known = g_score.get(&next).copied().unwrap_or(u32::MAX);
            if tentative_g < best_known {
                came_from.insert(next, current.position);
                g_score.insert(next, tentative_g);
                open.push(Frontier {
                    f_score: tentative_g.saturating_add(chebyshev_distance(next, goal_xy)),
                    position: next,
                });
            }
        }
    }

    Err(SpatialError::Unreachable {
        from: start,
        to: goal,
    })
}

fn reconstruct_path(
    came_from: &BTreeMap<(i32, i32), (i32, i32)>,
    start: (i32, i32),
    goal: (i32, i32),
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        let Some(&prev) = came_from.get(&current) else {
            break;
        };
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path.into_iter().map(|(x, y)| Position { x, y }).collect()
}
