//! Error taxonomy for map patch parsing and application.

use thiserror::Error;

/// Errors produced while tokenizing, parsing, or applying a patch script.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// The script contained no non-comment, non-blank lines.
    #[error("patch script is empty")]
    EmptyScript,

    /// Line `line` named a command that isn't in the DSL's command set.
    #[error("line {line}: unknown command {name:?}")]
    UnknownCommand {
        /// 1-indexed source line number.
        line: u32,
        /// The unrecognized command name.
        name: String,
    },

    /// Line `line`'s command is missing a required argument.
    #[error("line {line}: {command} missing required argument {key:?}")]
    MissingArg {
        /// 1-indexed source line number.
        line: u32,
        /// The command name.
        command: String,
        /// The missing argument's key.
        key: String,
    },

    /// Line `line`'s argument `key` could not be coerced to its expected type.
    #[error("line {line}: {command} argument {key:?} has invalid value {value:?}")]
    InvalidValue {
        /// 1-indexed source line number.
        line: u32,
        /// The command name.
        command: String,
        /// The offending argument's key.
        key: String,
        /// The raw, unparsed value.
        value: String,
    },

    /// Line `line` referenced a coordinate outside the target world's bounds.
    #[error("line {line}: ({x}, {y}) is out of bounds for a {width}x{height} world")]
    OutOfBounds {
        /// 1-indexed source line number.
        line: u32,
        /// Out-of-bounds x coordinate.
        x: i32,
        /// Out-of-bounds y coordinate.
        y: i32,
        /// World width.
        width: u32,
        /// World height.
        height: u32,
    },

    /// `MOVE_STRUCTURE` referenced a structure id not present in the world.
    #[error("line {line}: no structure with id {id}")]
    StructureNotFound {
        /// 1-indexed source line number.
        line: u32,
        /// The referenced structure id.
        id: String,
    },
}
