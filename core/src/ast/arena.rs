use core::fmt;

use bumpalo::Bump;

use super::{BinaryOp, UnaryOp};

/// Arena-allocated expression tree.
///
/// Nodes are allocated in a [`Bump`] and never move; dropping the arena
/// releases the whole tree at once, without a recursive destructor walk.
///
/// # Example
///
/// ```
/// use minmath_core::ast::{ArenaExpr, BinaryOp};
/// use bumpalo::Bump;
///
/// let arena = Bump::new();
/// let one = ArenaExpr::int(&arena, 1);
/// let x = ArenaExpr::var(&arena, "x");
/// let sum = ArenaExpr::binary(&arena, BinaryOp::Add, x, one);
/// assert_eq!(sum.to_string(), "(x + 1)");
/// ```
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum ArenaExpr<'a> {
    Int(i32),
    Var(&'a str),
    Unary {
        op: UnaryOp,
        expr: &'a ArenaExpr<'a>,
    },
    Binary {
        op: BinaryOp,
        left: &'a ArenaExpr<'a>,
        right: &'a ArenaExpr<'a>,
    },
    If {
        cond: &'a ArenaExpr<'a>,
        then_branch: &'a ArenaExpr<'a>,
        else_branch: &'a ArenaExpr<'a>,
    },
}

impl<'a> ArenaExpr<'a> {
    pub fn int(arena: &'a Bump, value: i32) -> &'a Self {
        arena.alloc(ArenaExpr::Int(value))
    }

    pub fn var(arena: &'a Bump, name: &str) -> &'a Self {
        arena.alloc(ArenaExpr::Var(arena.alloc_str(name)))
    }

    pub fn unary(arena: &'a Bump, op: UnaryOp, expr: &'a Self) -> &'a Self {
        arena.alloc(ArenaExpr::Unary { op, expr })
    }

    pub fn binary(arena: &'a Bump, op: BinaryOp, left: &'a Self, right: &'a Self) -> &'a Self {
        arena.alloc(ArenaExpr::Binary { op, left, right })
    }

    pub fn if_else(
        arena: &'a Bump,
        cond: &'a Self,
        then_branch: &'a Self,
        else_branch: &'a Self,
    ) -> &'a Self {
        arena.alloc(ArenaExpr::If {
            cond,
            then_branch,
            else_branch,
        })
    }
}

impl fmt::Display for ArenaExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::visitor::write_tree(f, self)
    }
}
