//! Decode a script into an ordered, schema-validated [`MapPatch`].

use crate::command::{parse_command, MapPatchCommand};
use crate::error::PatchError;
use crate::lexer::tokenize;

/// An ordered sequence of decoded commands, paired with their source line
/// numbers for audit/error reporting.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MapPatch {
    /// Decoded commands in script order.
    pub commands: Vec<(u32, MapPatchCommand)>,
}

/// Tokenize and schema-validate a patch script, without touching any world state.
///
/// # Errors
/// Returns [`PatchError::EmptyScript`] if the script has no commands, or a
/// tokenizer/schema error for the first line that fails to parse.
pub fn decode(script: &str) -> Result<MapPatch, PatchError> {
    let lines = tokenize(script)?;
    if lines.is_empty() {
        return Err(PatchError::EmptyScript);
    }
    let mut commands = Vec::with_capacity(lines.len());
    for raw_line in &lines {
        commands.push((raw_line.line, parse_command(raw_line)?));
    }
    Ok(MapPatch { commands })
}
