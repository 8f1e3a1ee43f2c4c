//! Deterministic, seed-driven dice mechanics.
//!
//! Every roll in the kernel — attacks, saves, checks, damage, heightmap
//! noise seeding — draws from a [`rng::DeterministicRng`] forked off a
//! world's seed string, so two runs from the same seed produce byte-identical
//! results.

pub mod error;
pub mod rng;
pub mod roll;

pub use error::DiceError;
pub use rng::DeterministicRng;
pub use roll::{check_degree, d20, roll_expr, roll_with_advantage, roll_with_disadvantage};
