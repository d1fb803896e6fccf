//! Bounds-checked interpreter.
//!
//! Decodes every instruction and validates every stack and parameter access.
//! Reports faults as [`ExecutionError`] instead of panicking.

use super::instruction_set::Instruction;
use super::{Code, Stack};
use crate::ast::{BinaryOp, UnaryOp};
use crate::evaluator::ExecutionError;
use crate::evaluator::operators::{eval_binary, eval_unary};

/// Result of a checked run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// The value returned by the program.
    pub value: i32,
    /// The deepest the operand stack got.
    pub high_water: usize,
}

/// Run `code` with every access checked.
pub fn execute_checked(
    code: &Code,
    params: &[i32],
    stack: &mut [i32],
) -> Result<i32, ExecutionError> {
    execute_reporting(code, params, stack).map(|report| report.value)
}

/// Like [`execute_checked`], also reporting the stack high-water mark.
pub fn execute_reporting(
    code: &Code,
    params: &[i32],
    stack: &mut [i32],
) -> Result<ExecutionReport, ExecutionError> {
    let bytes = code.bytes();
    let mut stack = Stack::new(stack);
    let mut ip = 0;

    loop {
        let offset = ip;
        let instruction = Instruction::decode(bytes, offset)
            .map_err(|error| ExecutionError::InvalidBytecode {
                offset: error.offset(),
            })?;
        ip += instruction.size();

        match instruction {
            Instruction::Nop => {}
            Instruction::PushInt(value) => stack.push(value, offset)?,
            Instruction::PushVar(index) => {
                let value = params.get(index as usize).copied().ok_or(
                    ExecutionError::ParameterOutOfRange {
                        index: index as usize,
                        len: params.len(),
                    },
                )?;
                stack.push(value, offset)?;
            }
            Instruction::Pop => {
                stack.pop(offset)?;
            }
            Instruction::Neg => unary(&mut stack, UnaryOp::Neg, offset)?,
            Instruction::BitNot => unary(&mut stack, UnaryOp::BitNot, offset)?,
            Instruction::Not => unary(&mut stack, UnaryOp::Not, offset)?,
            Instruction::Add => binary(&mut stack, BinaryOp::Add, offset)?,
            Instruction::Sub => binary(&mut stack, BinaryOp::Sub, offset)?,
            Instruction::Mul => binary(&mut stack, BinaryOp::Mul, offset)?,
            Instruction::Div => binary(&mut stack, BinaryOp::Div, offset)?,
            Instruction::Mod => binary(&mut stack, BinaryOp::Mod, offset)?,
            Instruction::BitAnd => binary(&mut stack, BinaryOp::BitAnd, offset)?,
            Instruction::BitOr => binary(&mut stack, BinaryOp::BitOr, offset)?,
            Instruction::BitXor => binary(&mut stack, BinaryOp::BitXor, offset)?,
            Instruction::Shl => binary(&mut stack, BinaryOp::Shl, offset)?,
            Instruction::Shr => binary(&mut stack, BinaryOp::Shr, offset)?,
            Instruction::Lt => binary(&mut stack, BinaryOp::Lt, offset)?,
            Instruction::Le => binary(&mut stack, BinaryOp::Le, offset)?,
            Instruction::Gt => binary(&mut stack, BinaryOp::Gt, offset)?,
            Instruction::Ge => binary(&mut stack, BinaryOp::Ge, offset)?,
            Instruction::Eq => binary(&mut stack, BinaryOp::Eq, offset)?,
            Instruction::Ne => binary(&mut stack, BinaryOp::Ne, offset)?,
            Instruction::Jump(target) => ip = target as usize,
            Instruction::JumpIfFalseKeep(target) => {
                if *stack.peek_mut(offset)? == 0 {
                    ip = target as usize;
                } else {
                    stack.pop(offset)?;
                }
            }
            Instruction::JumpIfTrueKeep(target) => {
                let top = stack.peek_mut(offset)?;
                if *top != 0 {
                    *top = 1;
                    ip = target as usize;
                } else {
                    stack.pop(offset)?;
                }
            }
            Instruction::JumpIfFalsePop(target) => {
                if stack.pop(offset)? == 0 {
                    ip = target as usize;
                }
            }
            Instruction::Return => {
                if stack.len() != 1 {
                    return Err(ExecutionError::UnbalancedReturn {
                        offset,
                        depth: stack.len(),
                    });
                }
                let value = stack.pop(offset)?;
                return Ok(ExecutionReport {
                    value,
                    high_water: stack.high_water(),
                });
            }
        }
    }
}

fn unary(stack: &mut Stack<'_>, op: UnaryOp, offset: usize) -> Result<(), ExecutionError> {
    let top = stack.peek_mut(offset)?;
    *top = eval_unary(op, *top);
    Ok(())
}

fn binary(stack: &mut Stack<'_>, op: BinaryOp, offset: usize) -> Result<(), ExecutionError> {
    let right = stack.pop(offset)?;
    let left = stack.peek_mut(offset)?;
    *left = eval_binary(op, *left, right)?;
    Ok(())
}
