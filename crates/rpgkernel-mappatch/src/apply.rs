//! Preview (no mutation) and atomic apply of a decoded patch against a [`PatchTarget`].

use crate::command::MapPatchCommand;
use crate::diff::PatchDiff;
use crate::error::PatchError;
use crate::patch::{decode, MapPatch};
use crate::target::{Annotation, PatchTarget};

/// Decode `script` and simulate it against a scratch copy of `target`,
/// reporting the commands and the diff that would result, without
/// mutating `target`.
///
/// # Errors
/// Returns the same errors [`apply`] would: a parse error, or the first
/// validation/bounds failure encountered while simulating the commands.
pub fn preview(target: &PatchTarget, script: &str) -> Result<(MapPatch, bool, PatchDiff), PatchError> {
    let patch = decode(script)?;
    let mut scratch = target.clone();
    let diff = apply_commands(&mut scratch, &patch)?;
    let will_modify = diff.is_nonzero();
    Ok((patch, will_modify, diff))
}

/// Decode `script` and apply it to `target` atomically: if any command
/// fails validation or a spatial bounds check, `target` is left completely
/// unchanged.
///
/// # Errors
/// Returns a parse error, or the first validation/bounds failure
/// encountered while applying the commands; in either case `target` is untouched.
pub fn apply(target: &mut PatchTarget, script: &str) -> Result<PatchDiff, PatchError> {
    let patch = decode(script)?;
    let mut scratch = target.clone();
    let diff = apply_commands(&mut scratch, &patch)?;
    *target = scratch;
    Ok(diff)
}

fn apply_commands(target: &mut PatchTarget, patch: &MapPatch) -> Result<PatchDiff, PatchError> {
    let mut diff = PatchDiff::default();
    for (line, command) in &patch.commands {
        apply_one(target, *line, command, &mut diff)?;
    }
    Ok(diff)
}

fn apply_one(
    target: &mut PatchTarget,
    line: u32,
    command: &MapPatchCommand,
    diff: &mut PatchDiff,
) -> Result<(), PatchError> {
    match command {
        MapPatchCommand::AddStructure { structure_type, x, y, name, population } => {
            check_bounds(target, line, *x, *y)?;
            target.structures.push(rpgkernel_types::Structure {
                id: rpgkernel_types::StructureId::new(),
                world_id: target.world_id,
                structure_type: *structure_type,
                x: *x,
                y: *y,
                name: name.clone(),
                population: *population,
            });
            diff.structures_added = diff.structures_added.saturating_add(1);
        }
        MapPatchCommand::SetBiome { x, y, biome } => {
            check_bounds(target, line, *x, *y)?;
            match target.tiles.get_mut(&(*x, *y)) {
                Some(tile) => {
                    tile.biome = *biome;
                    diff.tiles_changed = diff.tiles_changed.saturating_add(1);
                }
                None => {
                    target.tiles.insert(
                        (*x, *y),
                        rpgkernel_types::Tile {
                            world_id: target.world_id,
                            x: *x,
                            y: *y,
                            biome: *biome,
                            elevation: 0,
                            moisture: 0,
                            temperature: 0,
                        },
                    );
                    diff.tiles_added = diff.tiles_added.saturating_add(1);
                }
            }
        }
        MapPatchCommand::EditTile { x, y, elevation, moisture, temperature } => {
            check_bounds(target, line, *x, *y)?;
            match target.tiles.get_mut(&(*x, *y)) {
                Some(tile) => {
                    if let Some(value) = elevation {
                        tile.elevation = *value;
                    }
                    if let Some(value) = moisture {
                        tile.moisture = *value;
                    }
                    if let Some(value) = temperature {
                        tile.temperature = *value;
                    }
                    diff.tiles_changed = diff.tiles_changed.saturating_add(1);
                }
                None => {
                    target.tiles.insert(
                        (*x, *y),
                        rpgkernel_types::Tile {
                            world_id: target.world_id,
                            x: *x,
                            y: *y,
                            biome: rpgkernel_types::Biome::Plains,
                            elevation: elevation.unwrap_or(0),
                            moisture: moisture.unwrap_or(0),
                            temperature: temperature.unwrap_or(0),
                        },
                    );
                    diff.tiles_added = diff.tiles_added.saturating_add(1);
                }
            }
        }
        MapPatchCommand::AddRoad { path } => {
            for (x, y) in path {
                check_bounds(target, line, *x, *y)?;
                if target.roads.insert((*x, *y)) {
                    diff.tiles_changed = diff.tiles_changed.saturating_add(1);
                }
            }
        }
        MapPatchCommand::MoveStructure { id, x, y } => {
            check_bounds(target, line, *x, *y)?;
            let structure = target
                .structures
                .iter_mut()
                .find(|s| s.id == *id)
                .ok_or_else(|| PatchError::StructureNotFound { line, id: id.to_string() })?;
            structure.x = *x;
            structure.y = *y;
            diff.structures_changed = diff.structures_changed.saturating_add(1);
        }
        MapPatchCommand::AddAnnotation { x, y, text } => {
            check_bounds(target, line, *x, *y)?;
            target.annotations.push(Annotation { x: *x, y: *y, text: text.clone() });
            diff.annotations_added = diff.annotations_added.saturating_add(1);
        }
    }
    Ok(())
}

fn check_bounds(target: &PatchTarget, line: u32, x: i32, y: i32) -> Result<(), PatchError> {
    if target.in_bounds(x, y) {
        Ok(())
    } else {
        Err(PatchError::OutOfBounds { line, x, y, width: target.width, height: target.height })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rpgkernel_types::{Biome, Structure, StructureId, StructureType, Tile, WorldId};
    use std::collections::{BTreeMap, BTreeSet};

    fn make_target() -> PatchTarget {
        let world_id = WorldId::new();
        let mut tiles = BTreeMap::new();
        for x in 0..5 {
            for y in 0..5 {
                tiles.insert(
                    (x, y),
                    Tile { world_id, x, y, biome: Biome::Plains, elevation: 50, moisture: 50, temperature: 15 },
                );
            }
        }
        PatchTarget {
            world_id,
            width: 5,
            height: 5,
            tiles,
            structures: Vec::new(),
            roads: BTreeSet::new(),
            annotations: Vec::new(),
        }
    }

    #[test]
    fn preview_does_not_mutate_target() {
        let target = make_target();
        let script = r#"ADD_STRUCTURE type=city x=1 y=1 name="Preview City""#;
        let (patch, will_modify, diff) = preview(&target, script).expect("ok");
        assert_eq!(patch.commands.len(), 1);
        assert!(will_modify);
        assert_eq!(diff.structures_added, 1);
        assert!(target.structures.is_empty());
    }

    #[test]
    fn apply_then_preview_counts_match() {
        let mut target = make_target();
        let script = r#"ADD_STRUCTURE type=city x=1 y=1 name="Preview City""#;
        let (_, _, preview_diff) = preview(&target, script).expect("preview ok");
        let apply_diff = apply(&mut target, script).expect("apply ok");
        assert_eq!(preview_diff, apply_diff);
        assert_eq!(target.structures.len(), 1);
    }

    #[test]
    fn out_of_bounds_command_leaves_target_untouched() {
        let mut target = make_target();
        let script = "SET_BIOME x=99 y=99 biome=desert";
        let result = apply(&mut target, script);
        assert!(result.is_err());
        assert!(target.tiles.values().all(|t| t.biome == Biome::Plains));
    }

    #[test]
    fn atomic_apply_rejects_whole_script_on_later_failure() {
        let mut target = make_target();
        let script = "SET_BIOME x=0 y=0 biome=desert\nSET_BIOME x=99 y=99 biome=tundra";
        let result = apply(&mut target, script);
        assert!(result.is_err());
        let tile = target.tiles.get(&(0, 0)).expect("tile exists");
        assert_eq!(tile.biome, Biome::Plains);
    }

    #[test]
    fn move_structure_updates_position() {
        let mut target = make_target();
        let structure_id = StructureId::new();
        target.structures.push(Structure {
            id: structure_id,
            world_id: target.world_id,
            structure_type: StructureType::Village,
            x: 0,
            y: 0,
            name: "Outpost".to_owned(),
            population: Some(20),
        });
        let script = format!("MOVE_STRUCTURE id={structure_id} x=3 y=3");
        let diff = apply(&mut target, &script).expect("ok");
        assert_eq!(diff.structures_changed, 1);
        let moved = target.structures.iter().find(|s| s.id == structure_id).expect("present");
        assert_eq!((moved.x, moved.y), (3, 3));
    }

    #[test]
    fn move_unknown_structure_fails() {
        let mut target = make_target();
        let script = format!("MOVE_STRUCTURE id={} x=3 y=3", StructureId::new());
        assert!(apply(&mut target, &script).is_err());
    }
}
