//! Expression tree.
//!
//! Two storage schemes are provided:
//!
//! - [`Expr`]: every node owns its children through a `Box`.
//! - [`ArenaExpr`]: nodes live in a [`bumpalo::Bump`] and are released together
//!   with the arena.
//!
//! Both implement [`TreeView`](crate::visitor::TreeView), so the compiler and
//! the evaluator accept either one.

mod arena;

pub use arena::ArenaExpr;

use core::fmt;

use crate::Box;
use crate::String;
use crate::ToString;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Arithmetic negation: `-x`
    Neg,
    /// Bitwise complement: `~x`
    BitNot,
    /// Logical not: `!x` (always 0 or 1)
    Not,
}

impl UnaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::Not => "!",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    /// Short-circuit `&&`
    And,
    /// Short-circuit `||`
    Or,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        }
    }

    /// `true` for the six relational operators; their result is always 0 or 1.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    /// `true` for `&&` and `||`, whose right operand is evaluated conditionally.
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Heap-allocated expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Int(i32),
    Var(String),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
}

impl Expr {
    pub fn int(value: i32) -> Self {
        Expr::Int(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn if_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Returns the literal value if this node is an integer literal.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Expr::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Whether this node always evaluates to 0 or 1: a comparison or a logical not.
    pub fn is_boolean(&self) -> bool {
        match self {
            Expr::Unary {
                op: UnaryOp::Not, ..
            } => true,
            Expr::Binary { op, .. } => op.is_comparison(),
            _ => false,
        }
    }

    /// Copy this tree into `arena`.
    pub fn alloc_in<'a>(&self, arena: &'a bumpalo::Bump) -> &'a ArenaExpr<'a> {
        let node = match self {
            Expr::Int(value) => ArenaExpr::Int(*value),
            Expr::Var(name) => ArenaExpr::Var(arena.alloc_str(name)),
            Expr::Unary { op, expr } => ArenaExpr::Unary {
                op: *op,
                expr: expr.alloc_in(arena),
            },
            Expr::Binary { op, left, right } => ArenaExpr::Binary {
                op: *op,
                left: left.alloc_in(arena),
                right: right.alloc_in(arena),
            },
            Expr::If {
                cond,
                then_branch,
                else_branch,
            } => ArenaExpr::If {
                cond: cond.alloc_in(arena),
                then_branch: then_branch.alloc_in(arena),
                else_branch: else_branch.alloc_in(arena),
            },
        };
        arena.alloc(node)
    }
}

impl From<&ArenaExpr<'_>> for Expr {
    fn from(node: &ArenaExpr<'_>) -> Self {
        match node {
            ArenaExpr::Int(value) => Expr::Int(*value),
            ArenaExpr::Var(name) => Expr::Var(name.to_string()),
            ArenaExpr::Unary { op, expr } => Expr::unary(*op, Expr::from(*expr)),
            ArenaExpr::Binary { op, left, right } => {
                Expr::binary(*op, Expr::from(*left), Expr::from(*right))
            }
            ArenaExpr::If {
                cond,
                then_branch,
                else_branch,
            } => Expr::if_else(
                Expr::from(*cond),
                Expr::from(*then_branch),
                Expr::from(*else_branch),
            ),
        }
    }
}

/// Fully parenthesized rendering, e.g. `((a + 1) * - b)`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::visitor::write_tree(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_is_fully_parenthesized() {
        let expr = Expr::binary(
            BinaryOp::Mul,
            Expr::binary(BinaryOp::Add, Expr::var("a"), Expr::int(1)),
            Expr::unary(UnaryOp::Neg, Expr::var("b")),
        );
        assert_eq!(expr.to_string(), "((a + 1) * - b)");

        let cond = Expr::if_else(
            Expr::unary(UnaryOp::Not, Expr::var("x")),
            Expr::unary(UnaryOp::BitNot, Expr::int(3)),
            Expr::int(-4),
        );
        assert_eq!(cond.to_string(), "(!x ? ~3 : -4)");
    }

    #[test]
    fn test_is_boolean() {
        assert!(Expr::binary(BinaryOp::Lt, Expr::var("a"), Expr::int(1)).is_boolean());
        assert!(Expr::unary(UnaryOp::Not, Expr::var("a")).is_boolean());
        assert!(!Expr::binary(BinaryOp::And, Expr::var("a"), Expr::var("b")).is_boolean());
        assert!(!Expr::var("a").is_boolean());
    }

    #[test]
    fn test_arena_round_trip() {
        let arena = bumpalo::Bump::new();
        let expr = Expr::if_else(
            Expr::var("c"),
            Expr::binary(BinaryOp::Shl, Expr::var("x"), Expr::int(2)),
            Expr::unary(UnaryOp::Neg, Expr::var("c")),
        );
        let node = expr.alloc_in(&arena);
        assert_eq!(Expr::from(node), expr);
    }
}
