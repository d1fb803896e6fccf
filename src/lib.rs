//! minmath - integer expressions compiled to compact bytecode
//!
//! # Overview
//!
//! minmath evaluates C-like integer expressions over named variables. A
//! source string is parsed into a tree, optionally simplified, lowered to a
//! linear instruction stream and then run many times by a small stack VM:
//!
//! - `+ - * / %`, `& | ^ ~ << >>` with 32-bit wrapping arithmetic
//! - `< <= > >= == !=`, `!`, short-circuit `&&` / `||` (results are 0 or 1)
//! - `cond ? then : else`
//!
//! # Quick Start
//!
//! ```
//! use minmath::{Engine, EngineOptions};
//!
//! let engine = Engine::new(EngineOptions::default());
//! let mut expr = engine.compile_source("x > 0 ? x * 2 : -x").unwrap();
//!
//! expr.set("x", 21).unwrap();
//! assert_eq!(expr.run().unwrap(), 42);
//! expr.set("x", -5).unwrap();
//! assert_eq!(expr.run().unwrap(), 5);
//! ```
//!
//! # Lower-level pieces
//!
//! The stages are also available one by one:
//!
//! ```
//! use minmath::{compile, execute, optimize, parse, peephole_optimize};
//!
//! let tree = parse("(a + 0) * 8").unwrap();
//! let mut code = compile(&optimize(&tree)).unwrap();
//! peephole_optimize(&mut code).unwrap();
//!
//! let mut params = code.allocate_parameters();
//! let mut stack = code.allocate_stack();
//! code.set_param(&mut params, "a", 5);
//! assert_eq!(execute(&code, &params, &mut stack), 40);
//! ```

// Re-export public API from minmath_core
pub use minmath_core::api::{
    CompilationOptions, CompiledExpression, Engine, EngineOptions, Error, ExecutionOptions,
};

// Re-export the pipeline stages
pub use minmath_core::{
    ArenaExpr, BinaryOp, Code, Dispatch, Expr, UnaryOp, compile, eval, execute, execute_checked,
    execute_with, optimize, parse, peephole_optimize,
};
pub use minmath_core::{ast, compiler, evaluator, optimizer, parser, vm};

// Arena for `parser::parse_in` and `ArenaExpr`
pub use bumpalo::Bump;

// Re-export errors
pub use minmath_core::{ExecutionError, Fault, ParseError};

mod error_renderer;
pub use error_renderer::{render_error, render_error_to, render_error_to_string, render_error_to_string_no_color};
