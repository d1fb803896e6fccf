//! Runtime evaluation errors.
//!
//! These are errors that can occur while evaluating a tree or running a
//! program through the bounds-checked interpreter. The unchecked VM reports
//! division by zero as a trap instead.

use crate::String;

/// Runtime evaluation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// A variable had no value in the supplied bindings.
    #[error("unbound variable `{name}`")]
    UnboundVariable { name: String },

    /// Tree evaluation recursed deeper than allowed.
    #[error("evaluation depth exceeded (limit: {max_depth})")]
    DepthExceeded { max_depth: usize },

    /// The operand stack needed more slots than the caller provided.
    #[error("stack overflow at offset {offset}: capacity is {capacity}")]
    StackOverflow { offset: usize, capacity: usize },

    /// An instruction popped from an empty stack.
    #[error("stack underflow at offset {offset}")]
    StackUnderflow { offset: usize },

    /// `Return` was reached with other than exactly one value on the stack.
    #[error("return at offset {offset} with {depth} values on the stack")]
    UnbalancedReturn { offset: usize, depth: usize },

    /// A `PushVar` referenced a parameter the caller did not provide.
    #[error("parameter index {index} out of range ({len} parameters)")]
    ParameterOutOfRange { index: usize, len: usize },

    /// The instruction stream is malformed.
    #[error("invalid bytecode at offset {offset}")]
    InvalidBytecode { offset: usize },
}
