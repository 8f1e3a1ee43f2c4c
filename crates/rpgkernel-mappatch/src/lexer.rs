//! Tokenizer: splits a patch script into `{command, args}` lines.
//!
//! Grammar (line-oriented, case-sensitive commands):
//! ```text
//! line     := comment | blank | command
//! comment  := '#' .*
//! command  := IDENT (WS arg)*
//! arg      := KEY '=' VALUE
//! VALUE    := '"' (...no newlines...) '"' | non-space+
//! ```
// Quote-stripping slices on byte offsets adjacent to an ASCII `"`, always a char boundary.
#![allow(clippy::indexing_slicing)]

use std::collections::BTreeMap;

use crate::error::PatchError;

/// One tokenized, non-blank, non-comment source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// 1-indexed source line number, for error reporting.
    pub line: u32,
    /// The command identifier (first token on the line).
    pub command: String,
    /// Key-value arguments, in the order they appeared.
    pub args: BTreeMap<String, String>,
}

/// Tokenize a script into its non-blank, non-comment lines.
///
/// # Errors
/// Returns [`PatchError::InvalidValue`] if a `KEY=` argument has no value,
/// or an unterminated quoted value.
pub fn tokenize(script: &str) -> Result<Vec<RawLine>, PatchError> {
    let mut lines = Vec::new();
    for (index, raw) in script.lines().enumerate() {
        let line_number = u32::try_from(index.saturating_add(1)).unwrap_or(u32::MAX);
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push(tokenize_line(line_number, trimmed)?);
    }
    Ok(lines)
}

fn tokenize_line(line_number: u32, text: &str) -> Result<RawLine, PatchError> {
    let mut parts = split_respecting_quotes(text).into_iter();
    let command = parts.next().unwrap_or_default();
    let mut args = BTreeMap::new();
    for token in parts {
        let Some((key, value)) = token.split_once('=') else {
            return Err(PatchError::InvalidValue {
                line: line_number,
                command: command.clone(),
                key: token.clone(),
                value: String::new(),
            });
        };
        let unquoted = strip_quotes(value);
        args.insert(key.to_owned(), unquoted);
    }
    Ok(RawLine {
        line: line_number,
        command,
        args,
    })
}

fn strip_quotes(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len().saturating_sub(1)].to_owned()
    } else {
        value.to_owned()
    }
}

/// Split a line on whitespace, but keep whitespace inside `"..."` spans intact.
fn split_respecting_quotes(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in text.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
