//! Bytecode compiler.
//!
//! This module lowers expression trees into VM bytecode. The compiler uses the
//! visitor pattern to traverse the tree and emit bytecode.
//!
//! ## Design
//!
//! - Uses the TreeTransformer pattern, so heap and arena trees both compile
//! - Computes the maximum stack depth of each subtree while emitting
//! - Implements jump patching for control flow (conditionals, `&&`, `||`)
//! - Variables become parameters, indexed in order of first use

mod bytecode;
mod error;

#[cfg(test)]
mod bytecode_test;

pub use bytecode::BytecodeCompiler;
pub use error::Fault;

use crate::visitor::TreeView;
use crate::vm::Code;

/// Compile a tree into a program.
///
/// ```
/// use minmath_core::{compile, execute, parser};
///
/// let code = compile(&parser::parse("a * (b + 1)").unwrap()).unwrap();
/// let mut params = code.allocate_parameters();
/// let mut stack = code.allocate_stack();
/// code.set_param(&mut params, "a", 6);
/// code.set_param(&mut params, "b", 6);
/// assert_eq!(execute(&code, &params, &mut stack), 42);
/// ```
pub fn compile<'t, T: TreeView<'t>>(tree: T) -> Result<Code, Fault> {
    let code = BytecodeCompiler::compile(tree)?;
    tracing::debug!(
        bytes = code.bytes().len(),
        params = code.param_count(),
        max_stack = code.max_stack(),
        "Compiled expression"
    );
    Ok(code)
}
