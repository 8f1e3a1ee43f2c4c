//! Tagged command schema: coerces tokenized lines into typed commands.

use rpgkernel_types::{Biome, StructureId, StructureType};
use uuid::Uuid;

use crate::error::PatchError;
use crate::lexer::RawLine;

/// A single decoded, schema-validated map patch command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapPatchCommand {
    /// Place a new structure.
    AddStructure {
        /// Structure archetype.
        structure_type: StructureType,
        /// Grid x coordinate.
        x: i32,
        /// Grid y coordinate.
        y: i32,
        /// Display name.
        name: String,
        /// Population, for settlements that track one.
        population: Option<u32>,
    },
    /// Overwrite a tile's biome directly.
    SetBiome {
        /// Grid x coordinate.
        x: i32,
        /// Grid y coordinate.
        y: i32,
        /// New biome.
        biome: Biome,
    },
    /// Overwrite any subset of a tile's numeric fields.
    EditTile {
        /// Grid x coordinate.
        x: i32,
        /// Grid y coordinate.
        y: i32,
        /// New elevation, if given.
        elevation: Option<i32>,
        /// New moisture, if given.
        moisture: Option<i32>,
        /// New temperature, if given.
        temperature: Option<i32>,
    },
    /// Mark a sequence of tiles as road.
    AddRoad {
        /// Ordered `(x, y)` waypoints.
        path: Vec<(i32, i32)>,
    },
    /// Relocate an existing structure.
    MoveStructure {
        /// The structure to move.
        id: StructureId,
        /// New grid x coordinate.
        x: i32,
        /// New grid y coordinate.
        y: i32,
    },
    /// Attach a free-form text annotation to a point.
    AddAnnotation {
        /// Grid x coordinate.
        x: i32,
        /// Grid y coordinate.
        y: i32,
        /// Annotation text.
        text: String,
    },
}

fn arg<'a>(line: &'a RawLine, key: &str) -> Result<&'a str, PatchError> {
    line.args.get(key).map(String::as_str).ok_or_else(|| PatchError::MissingArg {
        line: line.line,
        command: line.command.clone(),
        key: key.to_owned(),
    })
}

fn parse_i32(line: &RawLine, key: &str) -> Result<i32, PatchError> {
    let raw = arg(line, key)?;
    raw.parse::<i32>().map_err(|_| PatchError::InvalidValue {
        line: line.line,
        command: line.command.clone(),
        key: key.to_owned(),
        value: raw.to_owned(),
    })
}

fn parse_i32_opt(line: &RawLine, key: &str) -> Result<Option<i32>, PatchError> {
    match line.args.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<i32>()
            .map(Some)
            .map_err(|_| PatchError::InvalidValue {
                line: line.line,
                command: line.command.clone(),
                key: key.to_owned(),
                value: raw.clone(),
            }),
    }
}

fn parse_u32_opt(line: &RawLine, key: &str) -> Result<Option<u32>, PatchError> {
    match line.args.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| PatchError::InvalidValue {
                line: line.line,
                command: line.command.clone(),
                key: key.to_owned(),
                value: raw.clone(),
            }),
    }
}

fn parse_structure_type(line: &RawLine, key: &str) -> Result<StructureType, PatchError> {
    let raw = arg(line, key)?;
    match raw {
        "city" => Ok(StructureType::City),
        "town" => Ok(StructureType::Town),
        "village" => Ok(StructureType::Village),
        "castle" => Ok(StructureType::Castle),
        "ruins" => Ok(StructureType::Ruins),
        "dungeon" => Ok(StructureType::Dungeon),
        "temple" => Ok(StructureType::Temple),
        _ => Err(PatchError::InvalidValue {
            line: line.line,
            command: line.command.clone(),
            key: key.to_owned(),
            value: raw.to_owned(),
        }),
    }
}

fn parse_biome(line: &RawLine, key: &str) -> Result<Biome, PatchError> {
    let raw = arg(line, key)?;
    match raw {
        "ocean" => Ok(Biome::Ocean),
        "beach" => Ok(Biome::Beach),
        "desert" => Ok(Biome::Desert),
        "rainforest" => Ok(Biome::Rainforest),
        "swamp" => Ok(Biome::Swamp),
        "savanna" => Ok(Biome::Savanna),
        "woodland" => Ok(Biome::Woodland),
        "tropical_forest" => Ok(Biome::TropicalForest),
        "plains" => Ok(Biome::Plains),
        "forest" => Ok(Biome::Forest),
        "marsh" => Ok(Biome::Marsh),
        "steppe" => Ok(Biome::Steppe),
        "taiga" => Ok(Biome::Taiga),
        "bog" => Ok(Biome::Bog),
        "tundra" => Ok(Biome::Tundra),
        "glacier" => Ok(Biome::Glacier),
        "mountain" => Ok(Biome::Mountain),
        _ => Err(PatchError::InvalidValue {
            line: line.line,
            command: line.command.clone(),
            key: key.to_owned(),
            value: raw.to_owned(),
        }),
    }
}

fn parse_path(line: &RawLine, key: &str) -> Result<Vec<(i32, i32)>, PatchError> {
    let raw = arg(line, key)?;
    let mut points = Vec::new();
    for waypoint in raw.split(';') {
        let Some((x_raw, y_raw)) = waypoint.split_once(',') else {
            return Err(PatchError::InvalidValue {
                line: line.line,
                command: line.command.clone(),
                key: key.to_owned(),
                value: raw.to_owned(),
            });
        };
        let invalid = || PatchError::InvalidValue {
            line: line.line,
            command: line.command.clone(),
            key: key.to_owned(),
            value: raw.to_owned(),
        };
        let x = x_raw.trim().parse::<i32>().map_err(|_| invalid())?;
        let y = y_raw.trim().parse::<i32>().map_err(|_| invalid())?;
        points.push((x, y));
    }
    Ok(points)
}

fn parse_structure_id(line: &RawLine, key: &str) -> Result<StructureId, PatchError> {
    let raw = arg(line, key)?;
    Uuid::parse_str(raw)
        .map(StructureId::from)
        .map_err(|_| PatchError::InvalidValue {
            line: line.line,
            command: line.command.clone(),
            key: key.to_owned(),
            value: raw.to_owned(),
        })
}

/// Coerce one tokenized line into a typed command, per its command-specific schema.
///
/// # Errors
/// Returns [`PatchError::UnknownCommand`] for an unrecognized command name,
/// [`PatchError::MissingArg`] for an absent required argument, or
/// [`PatchError::InvalidValue`] for a value that fails type coercion.
pub fn parse_command(line: &RawLine) -> Result<MapPatchCommand, PatchError> {
    match line.command.as_str() {
        "ADD_STRUCTURE" => Ok(MapPatchCommand::AddStructure {
            structure_type: parse_structure_type(line, "type")?,
            x: parse_i32(line, "x")?,
            y: parse_i32(line, "y")?,
            name: arg(line, "name")?.to_owned(),
            population: parse_u32_opt(line, "population")?,
        }),
        "SET_BIOME" => Ok(MapPatchCommand::SetBiome {
            x: parse_i32(line, "x")?,
            y: parse_i32(line, "y")?,
            biome: parse_biome(line, "biome")?,
        }),
        "EDIT_TILE" => Ok(MapPatchCommand::EditTile {
            x: parse_i32(line, "x")?,
            y: parse_i32(line, "y")?,
            elevation: parse_i32_opt(line, "elevation")?,
            moisture: parse_i32_opt(line, "moisture")?,
            temperature: parse_i32_opt(line, "temperature")?,
        }),
        "ADD_ROAD" => Ok(MapPatchCommand::AddRoad {
            path: parse_path(line, "path")?,
        }),
        "MOVE_STRUCTURE" => Ok(MapPatchCommand::MoveStructure {
            id: parse_structure_id(line, "id")?,
            x: parse_i32(line, "x")?,
            y: parse_i32(line, "y")?,
        }),
        "ADD_ANNOTATION" => Ok(MapPatchCommand::AddAnnotation {
            x: parse_i32(line, "x")?,
            y: parse_i32(line, "y")?,
            text: arg(line, "text")?.to_owned(),
        }),
        other => Err(PatchError::UnknownCommand {
            line: line.line,
            name: other.to_owned(),
        }),
    }
}
