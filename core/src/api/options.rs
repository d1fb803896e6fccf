//! Configuration options for the engine.

use crate::vm::Dispatch;

/// Configuration options for compilation.
///
/// These options select which optimization passes run between the tree and
/// the final program.
///
/// # Example
///
/// ```
/// use minmath_core::api::CompilationOptions;
///
/// let options = CompilationOptions {
///     optimize: false,
///     ..Default::default()
/// };
/// assert!(options.peephole);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilationOptions {
    /// Rewrite the tree with the algebraic optimizer before lowering it.
    ///
    /// Default: true
    pub optimize: bool,

    /// Collapse jump chains in the emitted bytecode.
    ///
    /// Default: true
    pub peephole: bool,
}

impl CompilationOptions {
    /// Lower the tree as written, with no optimization passes.
    pub const fn unoptimized() -> Self {
        Self {
            optimize: false,
            peephole: false,
        }
    }
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            optimize: true,
            peephole: true,
        }
    }
}

/// Configuration options for expression execution.
///
/// # Example
///
/// ```
/// use minmath_core::api::ExecutionOptions;
/// use minmath_core::Dispatch;
///
/// let options = ExecutionOptions {
///     dispatch: Dispatch::Threaded,
///     checked: false,
/// };
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Handler selection strategy of the unchecked loop.
    ///
    /// Default: [`Dispatch::Switch`]
    pub dispatch: Dispatch,

    /// Run through the bounds-checked interpreter, which reports division by
    /// zero as an error instead of trapping. `dispatch` is ignored.
    ///
    /// Default: false
    pub checked: bool,
}

/// Configuration options for the engine.
///
/// These options set the defaults for compilation and execution,
/// which can be overridden on a per-call basis.
///
/// # Example
///
/// ```
/// use minmath_core::api::{CompilationOptions, EngineOptions, ExecutionOptions};
///
/// let options = EngineOptions {
///     default_compilation_options: CompilationOptions::unoptimized(),
///     default_execution_options: ExecutionOptions {
///         checked: true,
///         ..Default::default()
///     },
/// };
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Default options for compilation.
    ///
    /// These can be overridden when calling `Engine::compile_with()`.
    pub default_compilation_options: CompilationOptions,

    /// Default options for execution.
    ///
    /// These can be overridden when calling `CompiledExpression::run_with()`.
    pub default_execution_options: ExecutionOptions,
}
