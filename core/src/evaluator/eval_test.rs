//! Unit tests for the evaluator.

use super::*;
use crate::ast::{BinaryOp, Expr};
use crate::{Vec, parser};
use bumpalo::Bump;

fn run(input: &str, bindings: &[(&str, i32)]) -> Result<i32, ExecutionError> {
    let expr = parser::parse(input).expect("parsing failed");
    eval(&expr, bindings)
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_precedence() {
    assert_eq!(run("3 + 4 * 2", &[]), Ok(11));
    assert_eq!(run("(3 + 4) * 2", &[]), Ok(14));
    assert_eq!(run("-(-5)", &[]), Ok(5));
    assert_eq!(run("1 << 2 + 1", &[]), Ok(8));
}

#[test]
fn test_wrapping_arithmetic() {
    assert_eq!(run("x + 1", &[("x", i32::MAX)]), Ok(i32::MIN));
    assert_eq!(run("x * x", &[("x", 65536)]), Ok(0));
    assert_eq!(run("-x", &[("x", i32::MIN)]), Ok(i32::MIN));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(
        run("a / b", &[("a", 1), ("b", 0)]),
        Err(ExecutionError::DivisionByZero)
    );
    assert_eq!(
        run("a % b", &[("a", 1), ("b", 0)]),
        Err(ExecutionError::DivisionByZero)
    );
}

// ============================================================================
// Variables
// ============================================================================

#[test]
fn test_repeated_variable() {
    assert_eq!(run("x * x + x", &[("x", 3)]), Ok(12));
}

#[test]
fn test_unbound_variable() {
    assert_eq!(
        run("x + y", &[("x", 1)]),
        Err(ExecutionError::UnboundVariable { name: "y".into() })
    );
}

#[test]
fn test_hash_map_bindings() {
    let mut bindings = hashbrown::HashMap::new();
    bindings.insert(crate::String::from("width"), 6);
    bindings.insert(crate::String::from("height"), 7);

    let expr = parser::parse("width * height").unwrap();
    assert_eq!(eval(&expr, &bindings), Ok(42));

    let list: Vec<(&str, i32)> = vec![("width", 2), ("height", 3)];
    assert_eq!(eval(&expr, &list), Ok(6));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_conditional() {
    assert_eq!(run("x ? 10 : 20", &[("x", 0)]), Ok(20));
    assert_eq!(run("x ? 10 : 20", &[("x", 5)]), Ok(10));
    assert_eq!(run("x ? y : 1 / x", &[("x", 1), ("y", 4)]), Ok(4));
}

#[test]
fn test_and_skips_right_operand() {
    // `b` is unbound: evaluating it would fail.
    assert_eq!(run("a && b", &[("a", 0)]), Ok(0));
    assert_eq!(run("a && 1 / b", &[("a", 0), ("b", 0)]), Ok(0));
    assert_eq!(run("a && b", &[("a", 3), ("b", -2)]), Ok(1));
}

#[test]
fn test_or_skips_right_operand() {
    assert_eq!(run("a || b", &[("a", 7)]), Ok(1));
    assert_eq!(run("a || b", &[("a", 0), ("b", 9)]), Ok(1));
    assert_eq!(run("a || b", &[("a", 0), ("b", 0)]), Ok(0));
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_depth_limit() {
    let mut expr = Expr::var("x");
    for _ in 0..50 {
        expr = Expr::binary(BinaryOp::Add, expr, Expr::int(1));
    }
    assert_eq!(eval(&expr, &[("x", 0)]), Ok(50));
    assert_eq!(
        eval_with_limits(&expr, &[("x", 0)], 10),
        Err(ExecutionError::DepthExceeded { max_depth: 10 })
    );
}

#[test]
fn test_arena_tree() {
    let arena = Bump::new();
    let node = parser::parse_in(&arena, "(a - b) * (a + b)").unwrap();
    assert_eq!(eval(node, &[("a", 5), ("b", 3)]), Ok(16));
}
