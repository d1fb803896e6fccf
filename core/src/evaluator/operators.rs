//! Binary and unary operator implementations.
//!
//! These are the reference semantics shared by the tree evaluator, the
//! constant folder and the bounds-checked VM.

use crate::ast::{BinaryOp, UnaryOp};
use crate::evaluator::ExecutionError;

/// Evaluate a binary operation on two integers.
///
/// Uses wrapping arithmetic to prevent panics on overflow; shift counts are
/// masked to the low five bits. `&&` and `||` are evaluated on both (already
/// computed) operands and yield 0 or 1.
/// Division by zero returns an error.
pub fn eval_binary(op: BinaryOp, left: i32, right: i32) -> Result<i32, ExecutionError> {
    let value = match op {
        BinaryOp::Add => left.wrapping_add(right),
        BinaryOp::Sub => left.wrapping_sub(right),
        BinaryOp::Mul => left.wrapping_mul(right),
        BinaryOp::Div => {
            if right == 0 {
                return Err(ExecutionError::DivisionByZero);
            }
            // Use wrapping_div to handle i32::MIN / -1 case
            left.wrapping_div(right)
        }
        BinaryOp::Mod => {
            if right == 0 {
                return Err(ExecutionError::DivisionByZero);
            }
            left.wrapping_rem(right)
        }
        BinaryOp::BitAnd => left & right,
        BinaryOp::BitOr => left | right,
        BinaryOp::BitXor => left ^ right,
        BinaryOp::Shl => left.wrapping_shl(right as u32),
        BinaryOp::Shr => left.wrapping_shr(right as u32),
        BinaryOp::And => (left != 0 && right != 0) as i32,
        BinaryOp::Or => (left != 0 || right != 0) as i32,
        BinaryOp::Lt => (left < right) as i32,
        BinaryOp::Gt => (left > right) as i32,
        BinaryOp::Le => (left <= right) as i32,
        BinaryOp::Ge => (left >= right) as i32,
        BinaryOp::Eq => (left == right) as i32,
        BinaryOp::Ne => (left != right) as i32,
    };
    Ok(value)
}

/// Evaluate a unary operation.
pub fn eval_unary(op: UnaryOp, value: i32) -> i32 {
    match op {
        UnaryOp::Neg => value.wrapping_neg(),
        UnaryOp::BitNot => !value,
        UnaryOp::Not => (value == 0) as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_add() {
        assert_eq!(eval_binary(BinaryOp::Add, 2, 3).unwrap(), 5);
        assert_eq!(eval_binary(BinaryOp::Add, -5, 3).unwrap(), -2);
        assert_eq!(eval_binary(BinaryOp::Add, i32::MAX, 1).unwrap(), i32::MIN);
    }

    #[test]
    fn test_int_sub() {
        assert_eq!(eval_binary(BinaryOp::Sub, 10, 4).unwrap(), 6);
        assert_eq!(eval_binary(BinaryOp::Sub, 3, 10).unwrap(), -7);
        assert_eq!(eval_binary(BinaryOp::Sub, i32::MIN, 1).unwrap(), i32::MAX);
    }

    #[test]
    fn test_int_div_truncates() {
        assert_eq!(eval_binary(BinaryOp::Div, 7, 2).unwrap(), 3);
        assert_eq!(eval_binary(BinaryOp::Div, -7, 2).unwrap(), -3);
        assert_eq!(eval_binary(BinaryOp::Mod, -7, 2).unwrap(), -1);
        assert_eq!(eval_binary(BinaryOp::Div, i32::MIN, -1).unwrap(), i32::MIN);
        assert_eq!(eval_binary(BinaryOp::Mod, i32::MIN, -1).unwrap(), 0);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            eval_binary(BinaryOp::Div, 1, 0),
            Err(ExecutionError::DivisionByZero)
        );
        assert_eq!(
            eval_binary(BinaryOp::Mod, 1, 0),
            Err(ExecutionError::DivisionByZero)
        );
    }

    #[test]
    fn test_shifts_mask_count() {
        assert_eq!(eval_binary(BinaryOp::Shl, 1, 4).unwrap(), 16);
        assert_eq!(eval_binary(BinaryOp::Shl, 1, 33).unwrap(), 2);
        assert_eq!(eval_binary(BinaryOp::Shr, -16, 2).unwrap(), -4);
    }

    #[test]
    fn test_logical_results_are_canonical() {
        assert_eq!(eval_binary(BinaryOp::And, 5, -3).unwrap(), 1);
        assert_eq!(eval_binary(BinaryOp::And, 5, 0).unwrap(), 0);
        assert_eq!(eval_binary(BinaryOp::Or, 0, 7).unwrap(), 1);
        assert_eq!(eval_binary(BinaryOp::Or, 0, 0).unwrap(), 0);
        assert_eq!(eval_binary(BinaryOp::Ne, 3, 4).unwrap(), 1);
    }

    #[test]
    fn test_unary() {
        assert_eq!(eval_unary(UnaryOp::Neg, 5), -5);
        assert_eq!(eval_unary(UnaryOp::Neg, i32::MIN), i32::MIN);
        assert_eq!(eval_unary(UnaryOp::BitNot, 0), -1);
        assert_eq!(eval_unary(UnaryOp::Not, 0), 1);
        assert_eq!(eval_unary(UnaryOp::Not, -9), 0);
    }
}
