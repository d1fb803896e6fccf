//! Public error type of the engine API.

use crate::String;
use crate::compiler::Fault;
use crate::evaluator::ExecutionError;
use crate::parser::ParseError;

/// Error type for all engine operations.
///
/// Wraps the error of whichever stage failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The source text did not parse.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Compilation or the peephole pass faulted.
    #[error("compilation failed: {0}")]
    Compilation(#[from] Fault),

    /// Execution failed (checked execution only).
    #[error("runtime error: {0}")]
    Runtime(#[from] ExecutionError),

    /// A value was supplied for a name the expression does not use.
    #[error("unknown parameter `{name}`")]
    UnknownParameter { name: String },
}
