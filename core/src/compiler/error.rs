//! Compilation faults.

use crate::String;

/// Errors reported by the compiler and the peephole pass.
///
/// No partially built or partially rewritten program is ever returned
/// alongside a fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// Growing a buffer failed, or the instruction stream outgrew the `u32`
    /// offset range.
    #[error("out of memory")]
    Memory,

    /// A component was handed input that breaks its invariants, such as
    /// corrupt bytecode.
    #[error("internal invariant violated: {message}")]
    InternalInvariant { message: String },
}
