#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

// Re-export for convenience so other modules don't need alloc:: prefix
#[allow(unused_imports)]
pub(crate) use alloc::{boxed::Box, format, string::String, string::ToString, vec, vec::Vec};

pub mod api;
pub mod ast;
pub mod compiler;
pub mod evaluator;
pub mod optimizer;
pub mod parser;
pub mod visitor;
pub mod vm;

pub use api::{CompiledExpression, Engine, EngineOptions};
pub use ast::{ArenaExpr, BinaryOp, Expr, UnaryOp};
pub use compiler::{Fault, compile};
pub use evaluator::{Bindings, ExecutionError, eval};
pub use optimizer::optimize;
pub use parser::{ParseError, parse};
pub use vm::{Code, Dispatch, execute, execute_checked, execute_with, peephole_optimize};

/// Test utilities for enabling logging in tests
#[cfg(test)]
pub mod test_utils {
    /// Initialize tracing subscriber for tests with DEBUG level
    /// Call this at the start of tests where you want to see logging output
    ///
    /// # Example
    /// ```ignore
    /// #[test]
    /// fn test_peephole() {
    ///     test_utils::init_test_logging();
    ///     // ... your test code
    /// }
    /// ```
    pub fn init_test_logging() {
        use tracing_subscriber::{EnvFilter, fmt};

        // Try to initialize, ignore error if already initialized
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    }
}
