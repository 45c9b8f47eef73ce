//! Script Context - Errors

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("No valid speaker lines found in the script")]
    NoTurns,

    #[error("Unrecognized script line {line_number}: {line}")]
    UnrecognizedLine { line_number: usize, line: String },
}
