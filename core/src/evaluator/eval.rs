//! Tree-walking evaluator.

use super::operators::{eval_binary, eval_unary};
use super::{Bindings, ExecutionError};
use crate::ToString;
use crate::ast::BinaryOp;
use crate::visitor::{ExprKind, TreeTransformer, TreeView};

/// Evaluates a tree node by node against a set of bindings.
///
/// `&&` and `||` short-circuit and a conditional evaluates only the selected
/// branch, so faults in the skipped operand are never raised.
pub struct Evaluator<'b, B: ?Sized> {
    bindings: &'b B,
    depth: usize,
    max_depth: usize,
}

impl<'b, B: Bindings + ?Sized> Evaluator<'b, B> {
    pub fn new(bindings: &'b B, max_depth: usize) -> Self {
        Self {
            bindings,
            depth: 0,
            max_depth,
        }
    }

    fn eval_node<'t, T: TreeView<'t>>(&mut self, tree: T) -> Result<i32, ExecutionError> {
        match tree.view() {
            ExprKind::Int(value) => Ok(value),
            ExprKind::Var(name) => {
                self.bindings
                    .get(name)
                    .ok_or_else(|| ExecutionError::UnboundVariable {
                        name: name.to_string(),
                    })
            }
            ExprKind::Unary(op, expr) => Ok(eval_unary(op, self.transform(expr)?)),
            ExprKind::Binary(BinaryOp::And, left, right) => {
                if self.transform(left)? == 0 {
                    return Ok(0);
                }
                Ok((self.transform(right)? != 0) as i32)
            }
            ExprKind::Binary(BinaryOp::Or, left, right) => {
                if self.transform(left)? != 0 {
                    return Ok(1);
                }
                Ok((self.transform(right)? != 0) as i32)
            }
            ExprKind::Binary(op, left, right) => {
                let left = self.transform(left)?;
                let right = self.transform(right)?;
                eval_binary(op, left, right)
            }
            ExprKind::If(cond, then_branch, else_branch) => {
                if self.transform(cond)? != 0 {
                    self.transform(then_branch)
                } else {
                    self.transform(else_branch)
                }
            }
        }
    }
}

impl<'t, T, B> TreeTransformer<'t, T> for Evaluator<'_, B>
where
    T: TreeView<'t>,
    B: Bindings + ?Sized,
{
    type Output = Result<i32, ExecutionError>;

    fn transform(&mut self, tree: T) -> Self::Output {
        // Check depth before recursing
        if self.depth >= self.max_depth {
            return Err(ExecutionError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }

        self.depth += 1;
        let result = self.eval_node(tree);
        self.depth -= 1;

        result
    }
}
