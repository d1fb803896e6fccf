//! Bytecode virtual machine.
//!
//! - [`Code`]: a compiled program
//! - [`execute`] / [`execute_with`]: the fast, unchecked loop with switch or
//!   threaded dispatch
//! - [`execute_checked`]: a bounds-checked interpreter reporting errors
//! - [`peephole_optimize`]: jump chain collapsing over raw bytecode

mod checked;
mod code;
mod instruction_set;
mod peephole;
mod runtime;
mod stack;


pub use checked::{ExecutionReport, execute_checked, execute_reporting};
pub use code::Code;
pub use instruction_set::{DecodeError, IMMEDIATE_SIZE, Instruction, Instructions, Opcode};
pub use peephole::peephole_optimize;
pub use runtime::{Dispatch, execute, execute_with};

pub(crate) use stack::Stack;
