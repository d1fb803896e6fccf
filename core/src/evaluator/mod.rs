//! Tree-walking evaluator for expression trees.
//!
//! This is the reference interpreter: the compiler, both optimizers and the VM
//! are all tested against it. It accepts either tree representation.
//!
//! ## Example
//!
//! ```
//! use minmath_core::{evaluator, parser};
//!
//! let expr = parser::parse("x * 2 + 1").unwrap();
//! assert_eq!(evaluator::eval(&expr, &[("x", 20)]), Ok(41));
//! ```

mod error;
mod eval;
pub mod operators;

#[cfg(test)]
mod eval_test;

pub use error::ExecutionError;
pub use eval::Evaluator;

use crate::String;
use crate::visitor::{TreeTransformer, TreeView};

/// Default recursion limit for [`eval`].
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// A source of variable values.
pub trait Bindings {
    /// The value bound to `name`, if any.
    fn get(&self, name: &str) -> Option<i32>;
}

impl Bindings for [(&str, i32)] {
    fn get(&self, name: &str) -> Option<i32> {
        self.iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| *value)
    }
}

impl<const N: usize> Bindings for [(&str, i32); N] {
    fn get(&self, name: &str) -> Option<i32> {
        Bindings::get(self.as_slice(), name)
    }
}

impl Bindings for crate::Vec<(&str, i32)> {
    fn get(&self, name: &str) -> Option<i32> {
        Bindings::get(self.as_slice(), name)
    }
}

impl Bindings for hashbrown::HashMap<String, i32> {
    fn get(&self, name: &str) -> Option<i32> {
        hashbrown::HashMap::get(self, name).copied()
    }
}

/// Evaluate a tree with the default depth limit.
pub fn eval<'t, T, B>(tree: T, bindings: &B) -> Result<i32, ExecutionError>
where
    T: TreeView<'t>,
    B: Bindings + ?Sized,
{
    eval_with_limits(tree, bindings, DEFAULT_MAX_DEPTH)
}

/// Evaluate a tree with a custom depth limit.
pub fn eval_with_limits<'t, T, B>(
    tree: T,
    bindings: &B,
    max_depth: usize,
) -> Result<i32, ExecutionError>
where
    T: TreeView<'t>,
    B: Bindings + ?Sized,
{
    Evaluator::new(bindings, max_depth).transform(tree)
}
