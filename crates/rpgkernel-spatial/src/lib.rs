//! Grid coordinates, pathfinding, line of sight, and area-of-effect geometry.

pub mod aoe;
pub mod error;
pub mod grid;
pub mod los;
pub mod pathfind;

pub use aoe::AreaOfEffect;
pub use error::SpatialError;
pub use grid::{chebyshev_distance, feet_to_tiles, tiles_to_feet, TILE_FEET};
pub use los::{has_line_of_sight, line_cells};
pub use pathfind::find_path;
