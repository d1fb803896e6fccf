//! Minmath VM Instructions - Variable-Length Byte Format
//!
//! This module defines the instruction set of the stack-based virtual machine.
//!
//! # Instruction Format
//!
//! Every instruction starts with a one byte opcode, optionally followed by a
//! 4 byte little-endian immediate:
//! ```text
//! ┌────────────┬──────────────────────────┐
//! │   Opcode   │ Immediate (0 or 4 bytes) │
//! │  (8 bits)  │  i32 / u32, little-endian│
//! └────────────┴──────────────────────────┘
//! ```
//!
//! Immediates are not aligned; readers must use unaligned loads.
//!
//! # Jumps
//!
//! Jump immediates are absolute byte offsets into the instruction stream and
//! always land on the first byte of an instruction.
//!
//! # Stack Discipline
//!
//! Stack effect notation: `[..., operand1, operand2] -> [..., result]`

use core::fmt;

use crate::Vec;
use crate::ast::{BinaryOp, UnaryOp};

/// Size of an immediate operand in bytes.
pub const IMMEDIATE_SIZE: usize = 4;

/// The opcode byte of an instruction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // ========================================================================
    // Special (0x00)
    // ========================================================================
    /// No operation. Left behind by the peephole pass as padding.
    Nop = 0x00,

    // ========================================================================
    // Stack (0x01 - 0x0F)
    // ========================================================================
    /// Push an integer literal
    /// Immediate: i32 | Stack: [...] -> [..., value]
    PushInt = 0x01,

    /// Push a parameter
    /// Immediate: u32 index | Stack: [...] -> [..., params[index]]
    PushVar = 0x02,

    /// Pop top value
    /// Stack: [..., a] -> [...]
    Pop = 0x03,

    // ========================================================================
    // Arithmetic (0x10 - 0x1F)
    // ========================================================================
    /// Stack: [..., a, b] -> [..., a + b]
    Add = 0x10,
    /// Stack: [..., a, b] -> [..., a - b]
    Sub = 0x11,
    /// Stack: [..., a, b] -> [..., a * b]
    Mul = 0x12,
    /// Stack: [..., a, b] -> [..., a / b] (traps when b == 0)
    Div = 0x13,
    /// Stack: [..., a, b] -> [..., a % b] (traps when b == 0)
    Mod = 0x14,
    /// Stack: [..., a] -> [..., -a]
    Neg = 0x15,

    // ========================================================================
    // Bitwise (0x20 - 0x2F)
    // ========================================================================
    BitAnd = 0x20,
    BitOr = 0x21,
    BitXor = 0x22,
    /// Shift count is masked to the low five bits.
    Shl = 0x23,
    /// Arithmetic shift; count is masked to the low five bits.
    Shr = 0x24,
    /// Stack: [..., a] -> [..., ~a]
    BitNot = 0x25,

    // ========================================================================
    // Comparison & Logic (0x30 - 0x3F)
    // ========================================================================
    /// Stack: [..., a, b] -> [..., a < b] (0 or 1)
    Lt = 0x30,
    Le = 0x31,
    Gt = 0x32,
    Ge = 0x33,
    Eq = 0x34,
    Ne = 0x35,
    /// Stack: [..., a] -> [..., a == 0] (0 or 1)
    Not = 0x36,

    // ========================================================================
    // Control Flow (0x40 - 0x4F)
    // ========================================================================
    /// Unconditional jump
    /// Immediate: u32 target | Stack: unchanged
    Jump = 0x40,

    /// Jump if the top is zero, keeping it; otherwise pop it and continue.
    /// Immediate: u32 target | Stack: [..., 0] -> [..., 0] or [..., a] -> [...]
    JumpIfFalseKeep = 0x41,

    /// Jump if the top is nonzero, replacing it with 1; otherwise pop it and
    /// continue.
    /// Immediate: u32 target | Stack: [..., a] -> [..., 1] or [..., 0] -> [...]
    JumpIfTrueKeep = 0x42,

    /// Pop the top and jump if it was zero.
    /// Immediate: u32 target | Stack: [..., a] -> [...]
    JumpIfFalsePop = 0x43,

    /// Pop the single remaining value and yield it.
    /// Stack: [a] -> []
    Return = 0x44,
}

impl Opcode {
    /// All opcodes, in byte order.
    pub const ALL: [Opcode; 28] = [
        Opcode::Nop,
        Opcode::PushInt,
        Opcode::PushVar,
        Opcode::Pop,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Mod,
        Opcode::Neg,
        Opcode::BitAnd,
        Opcode::BitOr,
        Opcode::BitXor,
        Opcode::Shl,
        Opcode::Shr,
        Opcode::BitNot,
        Opcode::Lt,
        Opcode::Le,
        Opcode::Gt,
        Opcode::Ge,
        Opcode::Eq,
        Opcode::Ne,
        Opcode::Not,
        Opcode::Jump,
        Opcode::JumpIfFalseKeep,
        Opcode::JumpIfTrueKeep,
        Opcode::JumpIfFalsePop,
        Opcode::Return,
    ];

    /// Decode an opcode byte.
    pub const fn from_byte(byte: u8) -> Option<Opcode> {
        let opcode = match byte {
            0x00 => Opcode::Nop,
            0x01 => Opcode::PushInt,
            0x02 => Opcode::PushVar,
            0x03 => Opcode::Pop,
            0x10 => Opcode::Add,
            0x11 => Opcode::Sub,
            0x12 => Opcode::Mul,
            0x13 => Opcode::Div,
            0x14 => Opcode::Mod,
            0x15 => Opcode::Neg,
            0x20 => Opcode::BitAnd,
            0x21 => Opcode::BitOr,
            0x22 => Opcode::BitXor,
            0x23 => Opcode::Shl,
            0x24 => Opcode::Shr,
            0x25 => Opcode::BitNot,
            0x30 => Opcode::Lt,
            0x31 => Opcode::Le,
            0x32 => Opcode::Gt,
            0x33 => Opcode::Ge,
            0x34 => Opcode::Eq,
            0x35 => Opcode::Ne,
            0x36 => Opcode::Not,
            0x40 => Opcode::Jump,
            0x41 => Opcode::JumpIfFalseKeep,
            0x42 => Opcode::JumpIfTrueKeep,
            0x43 => Opcode::JumpIfFalsePop,
            0x44 => Opcode::Return,
            _ => return None,
        };
        Some(opcode)
    }

    /// Size of the immediate following this opcode.
    pub const fn immediate_size(self) -> usize {
        match self {
            Opcode::PushInt
            | Opcode::PushVar
            | Opcode::Jump
            | Opcode::JumpIfFalseKeep
            | Opcode::JumpIfTrueKeep
            | Opcode::JumpIfFalsePop => IMMEDIATE_SIZE,
            _ => 0,
        }
    }

    /// Total encoded size of an instruction with this opcode.
    pub const fn size(self) -> usize {
        1 + self.immediate_size()
    }

    /// Check if this opcode carries a jump target
    pub const fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::Jump | Opcode::JumpIfFalseKeep | Opcode::JumpIfTrueKeep | Opcode::JumpIfFalsePop
        )
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "Nop",
            Opcode::PushInt => "PushInt",
            Opcode::PushVar => "PushVar",
            Opcode::Pop => "Pop",
            Opcode::Add => "Add",
            Opcode::Sub => "Sub",
            Opcode::Mul => "Mul",
            Opcode::Div => "Div",
            Opcode::Mod => "Mod",
            Opcode::Neg => "Neg",
            Opcode::BitAnd => "BitAnd",
            Opcode::BitOr => "BitOr",
            Opcode::BitXor => "BitXor",
            Opcode::Shl => "Shl",
            Opcode::Shr => "Shr",
            Opcode::BitNot => "BitNot",
            Opcode::Lt => "Lt",
            Opcode::Le => "Le",
            Opcode::Gt => "Gt",
            Opcode::Ge => "Ge",
            Opcode::Eq => "Eq",
            Opcode::Ne => "Ne",
            Opcode::Not => "Not",
            Opcode::Jump => "Jump",
            Opcode::JumpIfFalseKeep => "JumpIfFalseKeep",
            Opcode::JumpIfTrueKeep => "JumpIfTrueKeep",
            Opcode::JumpIfFalsePop => "JumpIfFalsePop",
            Opcode::Return => "Return",
        }
    }
}

/// A decoded instruction.
///
/// The VM never works on this type; it is used for disassembly, the checked
/// interpreter and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Nop,
    PushInt(i32),
    PushVar(u32),
    Pop,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    BitNot,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Not,
    Jump(u32),
    JumpIfFalseKeep(u32),
    JumpIfTrueKeep(u32),
    JumpIfFalsePop(u32),
    Return,
}

/// Error returned when a byte stream does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid opcode 0x{byte:02X} at offset {offset}")]
    UnknownOpcode { offset: usize, byte: u8 },
    #[error("truncated instruction at offset {offset}")]
    Truncated { offset: usize },
}

impl DecodeError {
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::UnknownOpcode { offset, .. } | DecodeError::Truncated { offset } => {
                *offset
            }
        }
    }
}

impl Instruction {
    /// The instruction for a non short-circuit binary operator.
    pub const fn from_binary(op: BinaryOp) -> Option<Instruction> {
        let instruction = match op {
            BinaryOp::Add => Instruction::Add,
            BinaryOp::Sub => Instruction::Sub,
            BinaryOp::Mul => Instruction::Mul,
            BinaryOp::Div => Instruction::Div,
            BinaryOp::Mod => Instruction::Mod,
            BinaryOp::BitAnd => Instruction::BitAnd,
            BinaryOp::BitOr => Instruction::BitOr,
            BinaryOp::BitXor => Instruction::BitXor,
            BinaryOp::Shl => Instruction::Shl,
            BinaryOp::Shr => Instruction::Shr,
            BinaryOp::Lt => Instruction::Lt,
            BinaryOp::Le => Instruction::Le,
            BinaryOp::Gt => Instruction::Gt,
            BinaryOp::Ge => Instruction::Ge,
            BinaryOp::Eq => Instruction::Eq,
            BinaryOp::Ne => Instruction::Ne,
            BinaryOp::And | BinaryOp::Or => return None,
        };
        Some(instruction)
    }

    pub const fn from_unary(op: UnaryOp) -> Instruction {
        match op {
            UnaryOp::Neg => Instruction::Neg,
            UnaryOp::BitNot => Instruction::BitNot,
            UnaryOp::Not => Instruction::Not,
        }
    }

    pub const fn opcode(self) -> Opcode {
        match self {
            Instruction::Nop => Opcode::Nop,
            Instruction::PushInt(_) => Opcode::PushInt,
            Instruction::PushVar(_) => Opcode::PushVar,
            Instruction::Pop => Opcode::Pop,
            Instruction::Add => Opcode::Add,
            Instruction::Sub => Opcode::Sub,
            Instruction::Mul => Opcode::Mul,
            Instruction::Div => Opcode::Div,
            Instruction::Mod => Opcode::Mod,
            Instruction::Neg => Opcode::Neg,
            Instruction::BitAnd => Opcode::BitAnd,
            Instruction::BitOr => Opcode::BitOr,
            Instruction::BitXor => Opcode::BitXor,
            Instruction::Shl => Opcode::Shl,
            Instruction::Shr => Opcode::Shr,
            Instruction::BitNot => Opcode::BitNot,
            Instruction::Lt => Opcode::Lt,
            Instruction::Le => Opcode::Le,
            Instruction::Gt => Opcode::Gt,
            Instruction::Ge => Opcode::Ge,
            Instruction::Eq => Opcode::Eq,
            Instruction::Ne => Opcode::Ne,
            Instruction::Not => Opcode::Not,
            Instruction::Jump(_) => Opcode::Jump,
            Instruction::JumpIfFalseKeep(_) => Opcode::JumpIfFalseKeep,
            Instruction::JumpIfTrueKeep(_) => Opcode::JumpIfTrueKeep,
            Instruction::JumpIfFalsePop(_) => Opcode::JumpIfFalsePop,
            Instruction::Return => Opcode::Return,
        }
    }

    /// Encoded size in bytes.
    pub const fn size(self) -> usize {
        self.opcode().size()
    }

    /// The target of a jump instruction.
    pub const fn jump_target(self) -> Option<u32> {
        match self {
            Instruction::Jump(target)
            | Instruction::JumpIfFalseKeep(target)
            | Instruction::JumpIfTrueKeep(target)
            | Instruction::JumpIfFalsePop(target) => Some(target),
            _ => None,
        }
    }

    /// Append the encoded instruction to `out`.
    pub fn encode(self, out: &mut Vec<u8>) {
        out.push(self.opcode() as u8);
        match self {
            Instruction::PushInt(value) => out.extend_from_slice(&value.to_le_bytes()),
            Instruction::PushVar(operand)
            | Instruction::Jump(operand)
            | Instruction::JumpIfFalseKeep(operand)
            | Instruction::JumpIfTrueKeep(operand)
            | Instruction::JumpIfFalsePop(operand) => out.extend_from_slice(&operand.to_le_bytes()),
            _ => {}
        }
    }

    /// Decode the instruction starting at `offset`.
    pub fn decode(bytes: &[u8], offset: usize) -> Result<Instruction, DecodeError> {
        let byte = *bytes.get(offset).ok_or(DecodeError::Truncated { offset })?;
        let opcode = Opcode::from_byte(byte).ok_or(DecodeError::UnknownOpcode { offset, byte })?;

        let operand = if opcode.immediate_size() == 0 {
            0
        } else {
            read_u32(bytes, offset + 1).ok_or(DecodeError::Truncated { offset })?
        };

        let instruction = match opcode {
            Opcode::Nop => Instruction::Nop,
            Opcode::PushInt => Instruction::PushInt(operand as i32),
            Opcode::PushVar => Instruction::PushVar(operand),
            Opcode::Pop => Instruction::Pop,
            Opcode::Add => Instruction::Add,
            Opcode::Sub => Instruction::Sub,
            Opcode::Mul => Instruction::Mul,
            Opcode::Div => Instruction::Div,
            Opcode::Mod => Instruction::Mod,
            Opcode::Neg => Instruction::Neg,
            Opcode::BitAnd => Instruction::BitAnd,
            Opcode::BitOr => Instruction::BitOr,
            Opcode::BitXor => Instruction::BitXor,
            Opcode::Shl => Instruction::Shl,
            Opcode::Shr => Instruction::Shr,
            Opcode::BitNot => Instruction::BitNot,
            Opcode::Lt => Instruction::Lt,
            Opcode::Le => Instruction::Le,
            Opcode::Gt => Instruction::Gt,
            Opcode::Ge => Instruction::Ge,
            Opcode::Eq => Instruction::Eq,
            Opcode::Ne => Instruction::Ne,
            Opcode::Not => Instruction::Not,
            Opcode::Jump => Instruction::Jump(operand),
            Opcode::JumpIfFalseKeep => Instruction::JumpIfFalseKeep(operand),
            Opcode::JumpIfTrueKeep => Instruction::JumpIfTrueKeep(operand),
            Opcode::JumpIfFalsePop => Instruction::JumpIfFalsePop(operand),
            Opcode::Return => Instruction::Return,
        };
        Ok(instruction)
    }
}

/// Read a little-endian `u32` at `offset`, if the bytes are there.
pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(IMMEDIATE_SIZE)?;
    let raw: [u8; IMMEDIATE_SIZE] = bytes.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushInt(value) => write!(f, "{:18} {}", "PushInt", value),
            Self::PushVar(index) => write!(f, "{:18} {}", "PushVar", index),
            Self::Jump(target)
            | Self::JumpIfFalseKeep(target)
            | Self::JumpIfTrueKeep(target)
            | Self::JumpIfFalsePop(target) => {
                write!(f, "{:18} @{}", self.opcode().mnemonic(), target)
            }
            _ => f.write_str(self.opcode().mnemonic()),
        }
    }
}

/// Iterator over the instructions of a byte stream, yielding their offsets.
///
/// Stops after the first decoding error.
pub struct Instructions<'a> {
    bytes: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            failed: false,
        }
    }
}

impl Iterator for Instructions<'_> {
    type Item = Result<(usize, Instruction), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.bytes.len() {
            return None;
        }
        let offset = self.offset;
        match Instruction::decode(self.bytes, offset) {
            Ok(instruction) => {
                self.offset += instruction.size();
                Some(Ok((offset, instruction)))
            }
            Err(error) => {
                self.failed = true;
                Some(Err(error))
            }
        }
    }
}
