//! Generic tree visitor pattern for traversing expression trees.
//!
//! This module provides a trait-based infrastructure for working with tree structures
//! in a type-safe and reusable way. It supports both arena and heap allocation, so
//! tree algorithms can be written once and run over either representation.

use core::fmt;

use crate::ast::{ArenaExpr, BinaryOp, Expr, UnaryOp};

/// One level of an expression tree, with children of type `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprKind<'t, T> {
    Int(i32),
    Var(&'t str),
    Unary(UnaryOp, T),
    Binary(BinaryOp, T, T),
    If(T, T, T),
}

impl<T> ExprKind<'_, T> {
    /// Whether the node always evaluates to 0 or 1: a comparison or a logical not.
    pub fn is_boolean(&self) -> bool {
        match self {
            ExprKind::Unary(UnaryOp::Not, _) => true,
            ExprKind::Binary(op, _, _) => op.is_comparison(),
            _ => false,
        }
    }
}

/// Read-only view into a tree node, allowing deconstruction.
///
/// Implemented by references to both tree representations.
pub trait TreeView<'t>: Copy {
    /// Deconstruct this node into its kind.
    fn view(self) -> ExprKind<'t, Self>;
}

impl<'t> TreeView<'t> for &'t Expr {
    #[inline]
    fn view(self) -> ExprKind<'t, Self> {
        match self {
            Expr::Int(value) => ExprKind::Int(*value),
            Expr::Var(name) => ExprKind::Var(name.as_str()),
            Expr::Unary { op, expr } => ExprKind::Unary(*op, expr.as_ref()),
            Expr::Binary { op, left, right } => {
                ExprKind::Binary(*op, left.as_ref(), right.as_ref())
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => ExprKind::If(cond.as_ref(), then_branch.as_ref(), else_branch.as_ref()),
        }
    }
}

impl<'t, 'a: 't> TreeView<'t> for &'t ArenaExpr<'a> {
    #[inline]
    fn view(self) -> ExprKind<'t, Self> {
        match self {
            ArenaExpr::Int(value) => ExprKind::Int(*value),
            ArenaExpr::Var(name) => ExprKind::Var(*name),
            ArenaExpr::Unary { op, expr } => ExprKind::Unary(*op, *expr),
            ArenaExpr::Binary { op, left, right } => ExprKind::Binary(*op, *left, *right),
            ArenaExpr::If {
                cond,
                then_branch,
                else_branch,
            } => ExprKind::If(*cond, *then_branch, *else_branch),
        }
    }
}

/// Generic transformer for tree structures.
///
/// This trait can be used for:
/// - Evaluation (Output = value type, e.g., i32)
/// - Side-effect traversals (Output = (), e.g., bytecode generation)
/// - Analysis (Output = analysis result, e.g., stack depth)
///
/// The transformer can be stateful (uses `&mut self`) to accumulate results
/// or maintain mutable state during traversal.
pub trait TreeTransformer<'t, T: TreeView<'t>> {
    /// The type of value produced by the transformation.
    type Output;

    /// Transform a tree node.
    ///
    /// The transformer is responsible for recursing into children as needed.
    fn transform(&mut self, tree: T) -> Self::Output;
}

/// Shared `Display` implementation for both tree representations.
pub(crate) fn write_tree<'t, T: TreeView<'t>>(f: &mut fmt::Formatter<'_>, tree: T) -> fmt::Result {
    match tree.view() {
        ExprKind::Int(value) => write!(f, "{}", value),
        ExprKind::Var(name) => f.write_str(name),
        ExprKind::Unary(op, expr) => {
            match op {
                // The space keeps `- -1` from reading as a decrement.
                UnaryOp::Neg => f.write_str("- ")?,
                _ => f.write_str(op.symbol())?,
            }
            write_tree(f, expr)
        }
        ExprKind::Binary(op, left, right) => {
            f.write_str("(")?;
            write_tree(f, left)?;
            write!(f, " {} ", op.symbol())?;
            write_tree(f, right)?;
            f.write_str(")")
        }
        ExprKind::If(cond, then_branch, else_branch) => {
            f.write_str("(")?;
            write_tree(f, cond)?;
            f.write_str(" ? ")?;
            write_tree(f, then_branch)?;
            f.write_str(" : ")?;
            write_tree(f, else_branch)?;
            f.write_str(")")
        }
    }
}
