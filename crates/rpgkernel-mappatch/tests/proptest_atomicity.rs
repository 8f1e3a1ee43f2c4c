//! Property test: a patch script that fails validation anywhere must leave
//! its target's tile and structure counts completely unchanged.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use rpgkernel_mappatch::{apply, PatchTarget};
use rpgkernel_types::{Biome, Tile, WorldId};

fn make_target(width: u32, height: u32) -> PatchTarget {
    let world_id = WorldId::new();
    let mut tiles = BTreeMap::new();
    for x in 0..i32::try_from(width).unwrap_or(0) {
        for y in 0..i32::try_from(height).unwrap_or(0) {
            tiles.insert(
                (x, y),
                Tile { world_id, x, y, biome: Biome::Plains, elevation: 50, moisture: 50, temperature: 15 },
            );
        }
    }
    PatchTarget {
        world_id,
        width,
        height,
        tiles,
        structures: Vec::new(),
        roads: BTreeSet::new(),
        annotations: Vec::new(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A valid `SET_BIOME` line followed by a guaranteed out-of-bounds one
    /// must leave the whole target untouched: no partial application.
    #[test]
    fn out_of_bounds_second_line_rolls_back_the_whole_script(
        x in 0i32..8, y in 0i32..8, bogus_x in 100i32..200, bogus_y in 100i32..200,
    ) {
        let mut target = make_target(8, 8);
        let before = target.clone();
        let script = format!("SET_BIOME x={x} y={y} biome=desert\nSET_BIOME x={bogus_x} y={bogus_y} biome=tundra");

        let result = apply(&mut target, &script);

        prop_assert!(result.is_err());
        prop_assert_eq!(target, before);
    }

    /// A script made entirely of in-bounds `SET_BIOME` lines always
    /// succeeds and changes exactly as many tiles as lines.
    #[test]
    fn all_in_bounds_lines_succeed_and_count_matches(count in 1usize..8) {
        let mut target = make_target(8, 8);
        let script = (0..count)
            .map(|i| format!("SET_BIOME x={i} y=0 biome=desert"))
            .collect::<Vec<_>>()
            .join("\n");

        let diff = apply(&mut target, &script).expect("all lines in bounds");
        prop_assert_eq!(diff.tiles_changed, u32::try_from(count).unwrap_or(0));
    }
}
