//! High-level API: compile once, run many times.
//!
//! # Example
//!
//! ```
//! use minmath_core::api::{Engine, EngineOptions};
//!
//! let engine = Engine::new(EngineOptions::default());
//! let mut expr = engine.compile_source("x * x + 1").unwrap();
//!
//! for x in 0..4 {
//!     expr.set("x", x).unwrap();
//!     assert_eq!(expr.run().unwrap(), x * x + 1);
//! }
//! ```

pub mod engine;
pub mod error;
pub mod expression;
pub mod options;


pub use engine::Engine;
pub use error::Error;
pub use expression::CompiledExpression;
pub use options::{CompilationOptions, EngineOptions, ExecutionOptions};
