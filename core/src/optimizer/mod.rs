//! Tree-to-tree optimizer.
//!
//! A single post-order pass performing constant folding, exact algebraic
//! simplification, strength reduction of multiplications by powers of two and
//! conditional simplification. The input is never modified; a fresh tree is
//! returned.
//!
//! Division and modulo by a literal zero are left in place so the fault still
//! happens at execution time.
//!
//! ```
//! use minmath_core::{optimizer, parser};
//!
//! let expr = parser::parse("(x + 0) * 8 + 2 * 3").unwrap();
//! assert_eq!(optimizer::optimize(&expr).to_string(), "((x << 3) + 6)");
//! ```

mod rewrite;


pub use rewrite::Optimizer;

use crate::ast::Expr;
use crate::visitor::{TreeTransformer, TreeView};

/// Optimize a tree, returning a new heap tree that evaluates identically.
pub fn optimize<'t, T: TreeView<'t>>(tree: T) -> Expr {
    let mut optimizer = Optimizer::new();
    let optimized = optimizer.transform(tree);
    tracing::debug!(
        rewrites = optimizer.rewrites(),
        "Tree optimization finished"
    );
    optimized
}
