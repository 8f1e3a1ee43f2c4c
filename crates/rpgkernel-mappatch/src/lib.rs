//! Line-oriented map patch DSL: tokenize, parse, preview, and atomically
//! apply world mutations, per `spec.md` §4.E.

pub mod apply;
pub mod command;
pub mod diff;
pub mod error;
pub mod lexer;
pub mod patch;
pub mod target;

pub use apply::{apply, preview};
pub use command::MapPatchCommand;
pub use diff::PatchDiff;
pub use error::PatchError;
pub use lexer::{tokenize, RawLine};
pub use patch::{decode, MapPatch};
pub use target::{Annotation, PatchTarget};
