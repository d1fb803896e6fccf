//! Rewrite rules.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::evaluator::operators::{eval_binary, eval_unary};
use crate::visitor::{ExprKind, TreeTransformer, TreeView};
use crate::ToString;

/// Post-order tree rewriter.
///
/// Counts the rewrites it performs so callers can report them.
#[derive(Debug, Default)]
pub struct Optimizer {
    rewrites: usize,
}

impl Optimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rewrites applied so far.
    pub fn rewrites(&self) -> usize {
        self.rewrites
    }

    fn rewritten(&mut self, rule: &'static str, expr: Expr) -> Expr {
        self.rewrites += 1;
        tracing::trace!(rule, result = %expr, "Rewrote node");
        expr
    }

    fn unary(&mut self, op: UnaryOp, child: Expr) -> Expr {
        if let Some(value) = child.as_int() {
            return self.rewritten("fold", Expr::Int(eval_unary(op, value)));
        }

        match child {
            // `!!x` is only the identity when x is already 0 or 1.
            Expr::Unary { op: inner, expr }
                if inner == op && (op != UnaryOp::Not || expr.is_boolean()) =>
            {
                self.rewritten("double negation", *expr)
            }
            child => Expr::unary(op, child),
        }
    }

    fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        use BinaryOp::*;

        if let (Some(l), Some(r)) = (left.as_int(), right.as_int()) {
            return match eval_binary(op, l, r) {
                Ok(value) => self.rewritten("fold", Expr::Int(value)),
                Err(_) => Expr::binary(op, left, right),
            };
        }

        // Both operands of `&&` and `||` are only ever tested against zero.
        let (left, right) = if op.is_short_circuit() {
            (self.strip_double_not(left), self.strip_double_not(right))
        } else {
            (left, right)
        };

        let (rule, expr) = match (op, left.as_int(), right.as_int()) {
            (Add | Sub | BitOr | Shl | Shr, _, Some(0)) => ("right identity", left),
            (Add | BitOr, Some(0), _) => ("left identity", right),
            (Sub, Some(0), _) => ("negation", Expr::unary(UnaryOp::Neg, right)),

            (Or, _, Some(0)) => ("or zero", to_bool(left)),
            (Or, Some(0), _) => ("or zero", to_bool(right)),
            (Or, _, Some(_)) | (Or, Some(_), _) => ("or nonzero", Expr::Int(1)),

            (Mul | And, Some(0), _) | (Mul | And, _, Some(0)) => ("annihilator", Expr::Int(0)),
            (And, _, Some(_)) => ("and nonzero", to_bool(left)),
            (And, Some(_), _) => ("and nonzero", to_bool(right)),

            (Eq, Some(0), _) => ("equals zero", Expr::unary(UnaryOp::Not, right)),
            (Eq, _, Some(0)) => ("equals zero", Expr::unary(UnaryOp::Not, left)),

            (Mul | Div, _, Some(1)) => ("right identity", left),
            (Mul, Some(1), _) => ("left identity", right),

            (Mul, _, Some(factor)) if shift_count(factor).is_some() => {
                ("strength reduction", shift(Shl, left, factor))
            }
            (Mul, Some(factor), _) if shift_count(factor).is_some() => {
                ("strength reduction", shift(Shl, right, factor))
            }
            // Only exact when the dividend cannot be negative.
            (Div, _, Some(factor)) if left.is_boolean() && shift_count(factor).is_some() => {
                ("strength reduction", shift(Shr, left, factor))
            }

            _ => return Expr::binary(op, left, right),
        };
        self.rewritten(rule, expr)
    }

    fn conditional(&mut self, cond: Expr, then_branch: Expr, else_branch: Expr) -> Expr {
        match cond {
            Expr::Binary {
                op: BinaryOp::Ne,
                left,
                right,
            } if right.as_int() == Some(0) => self.rewritten(
                "test against zero",
                Expr::if_else(*left, then_branch, else_branch),
            ),
            Expr::Binary {
                op: BinaryOp::Ne,
                left,
                right,
            } if left.as_int() == Some(0) => self.rewritten(
                "test against zero",
                Expr::if_else(*right, then_branch, else_branch),
            ),
            Expr::Unary {
                op: UnaryOp::Not,
                expr,
            } => match *expr {
                Expr::Unary {
                    op: UnaryOp::Not,
                    expr: inner,
                } => self.rewritten(
                    "double negation",
                    Expr::if_else(*inner, then_branch, else_branch),
                ),
                inner => self.rewritten(
                    "swap branches",
                    Expr::if_else(inner, else_branch, then_branch),
                ),
            },
            cond => Expr::if_else(cond, then_branch, else_branch),
        }
    }

    fn strip_double_not(&mut self, expr: Expr) -> Expr {
        match expr {
            Expr::Unary {
                op: UnaryOp::Not,
                expr: inner,
            } => match *inner {
                Expr::Unary {
                    op: UnaryOp::Not,
                    expr: innermost,
                } => self.rewritten("redundant boolean conversion", *innermost),
                inner => Expr::unary(UnaryOp::Not, inner),
            },
            expr => expr,
        }
    }
}

impl<'t, T: TreeView<'t>> TreeTransformer<'t, T> for Optimizer {
    type Output = Expr;

    fn transform(&mut self, tree: T) -> Expr {
        match tree.view() {
            ExprKind::Int(value) => Expr::Int(value),
            ExprKind::Var(name) => Expr::Var(name.to_string()),
            ExprKind::Unary(op, expr) => {
                let child = self.transform(expr);
                self.unary(op, child)
            }
            ExprKind::Binary(op, left, right) => {
                let left = self.transform(left);
                let right = self.transform(right);
                self.binary(op, left, right)
            }
            ExprKind::If(cond, then_branch, else_branch) => {
                let cond = self.transform(cond);
                if let Some(value) = cond.as_int() {
                    // The discarded branch is never visited.
                    let selected = if value != 0 { then_branch } else { else_branch };
                    let selected = self.transform(selected);
                    return self.rewritten("constant condition", selected);
                }
                let then_branch = self.transform(then_branch);
                let else_branch = self.transform(else_branch);
                self.conditional(cond, then_branch, else_branch)
            }
        }
    }
}

/// `x` if it is already 0 or 1, otherwise `!!x`.
fn to_bool(expr: Expr) -> Expr {
    if expr.is_boolean() {
        expr
    } else {
        Expr::unary(UnaryOp::Not, Expr::unary(UnaryOp::Not, expr))
    }
}

/// The shift amount `k` when `factor == 2^k` for some `k >= 1`.
fn shift_count(factor: i32) -> Option<i32> {
    (factor.count_ones() == 1 && factor != 1).then(|| factor.trailing_zeros() as i32)
}

fn shift(op: BinaryOp, operand: Expr, factor: i32) -> Expr {
    let count = shift_count(factor).unwrap_or_default();
    Expr::binary(op, operand, Expr::Int(count))
}
