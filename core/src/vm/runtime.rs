//! The unchecked execution loop.
//!
//! Buffer sizes are validated once on entry. After that the loop trusts the
//! [`Code`] invariants and performs no bounds checks.

use core::ops::ControlFlow;
use core::ptr;

use super::Code;
use super::instruction_set::{IMMEDIATE_SIZE, Opcode};

/// How the execution loop selects the handler for each opcode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Dispatch {
    /// A `match` over the opcode.
    #[default]
    Switch,
    /// A static table of handler function pointers indexed by opcode byte.
    Threaded,
}

/// Run `code` with the default dispatch strategy.
///
/// # Panics
///
/// Panics if `params` is shorter than [`Code::param_count`] or `stack` is
/// shorter than [`Code::max_stack`], and on division or modulo by zero.
pub fn execute(code: &Code, params: &[i32], stack: &mut [i32]) -> i32 {
    execute_with(code, params, stack, Dispatch::default())
}

/// Run `code` with an explicit dispatch strategy.
///
/// Both strategies produce identical results.
///
/// # Panics
///
/// Same as [`execute`].
pub fn execute_with(code: &Code, params: &[i32], stack: &mut [i32], dispatch: Dispatch) -> i32 {
    assert!(
        params.len() >= code.param_count(),
        "parameter buffer too small: {} < {}",
        params.len(),
        code.param_count()
    );
    assert!(
        stack.len() >= code.max_stack(),
        "stack buffer too small: {} < {}",
        stack.len(),
        code.max_stack()
    );

    let mut machine = Machine {
        code: code.bytes(),
        params,
        stack,
        ip: 0,
        sp: 0,
    };

    // SAFETY: the buffers are large enough for this program and `Code` only
    // holds well-formed streams produced by the compiler.
    unsafe {
        match dispatch {
            Dispatch::Switch => run_switch(&mut machine),
            Dispatch::Threaded => run_threaded(&mut machine),
        }
    }
}

/// Execution registers plus the buffers they index into.
struct Machine<'a> {
    code: &'a [u8],
    params: &'a [i32],
    stack: &'a mut [i32],
    ip: usize,
    /// Number of values on the stack.
    sp: usize,
}

impl Machine<'_> {
    #[inline(always)]
    unsafe fn fetch(&mut self) -> u8 {
        let byte = unsafe { *self.code.get_unchecked(self.ip) };
        self.ip += 1;
        byte
    }

    #[inline(always)]
    unsafe fn immediate(&mut self) -> u32 {
        debug_assert!(self.ip + IMMEDIATE_SIZE <= self.code.len());
        let raw = unsafe {
            ptr::read_unaligned(self.code.as_ptr().add(self.ip) as *const [u8; IMMEDIATE_SIZE])
        };
        self.ip += IMMEDIATE_SIZE;
        u32::from_le_bytes(raw)
    }

    #[inline(always)]
    unsafe fn push(&mut self, value: i32) {
        debug_assert!(self.sp < self.stack.len(), "stack overflow");
        unsafe { *self.stack.get_unchecked_mut(self.sp) = value };
        self.sp += 1;
    }

    #[inline(always)]
    unsafe fn pop(&mut self) -> i32 {
        debug_assert!(self.sp > 0, "stack underflow");
        self.sp -= 1;
        unsafe { *self.stack.get_unchecked(self.sp) }
    }

    #[inline(always)]
    unsafe fn top(&mut self) -> &mut i32 {
        debug_assert!(self.sp > 0, "stack underflow");
        unsafe { self.stack.get_unchecked_mut(self.sp - 1) }
    }

    /// Pop the right operand and combine it into the left one in place.
    #[inline(always)]
    unsafe fn binary(&mut self, op: impl FnOnce(i32, i32) -> i32) -> ControlFlow<i32> {
        unsafe {
            let right = self.pop();
            let left = self.top();
            *left = op(*left, right);
        }
        ControlFlow::Continue(())
    }

    #[inline(always)]
    unsafe fn unary(&mut self, op: impl FnOnce(i32) -> i32) -> ControlFlow<i32> {
        unsafe {
            let operand = self.top();
            *operand = op(*operand);
        }
        ControlFlow::Continue(())
    }
}

type Handler = for<'m, 'a> unsafe fn(&'m mut Machine<'a>) -> ControlFlow<i32>;

// ============================================================================
// Handlers
// ============================================================================
//
// Each handler runs with `ip` just past the opcode byte.

unsafe fn op_nop(_: &mut Machine<'_>) -> ControlFlow<i32> {
    ControlFlow::Continue(())
}

unsafe fn op_push_int(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe {
        let value = m.immediate() as i32;
        m.push(value);
    }
    ControlFlow::Continue(())
}

unsafe fn op_push_var(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe {
        let index = m.immediate() as usize;
        debug_assert!(index < m.params.len());
        let value = *m.params.get_unchecked(index);
        m.push(value);
    }
    ControlFlow::Continue(())
}

unsafe fn op_pop(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.pop() };
    ControlFlow::Continue(())
}

unsafe fn op_add(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(i32::wrapping_add) }
}

unsafe fn op_sub(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(i32::wrapping_sub) }
}

unsafe fn op_mul(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(i32::wrapping_mul) }
}

// `wrapping_div` and `wrapping_rem` panic on a zero divisor: that is the trap.
unsafe fn op_div(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(i32::wrapping_div) }
}

unsafe fn op_mod(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(i32::wrapping_rem) }
}

unsafe fn op_neg(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.unary(i32::wrapping_neg) }
}

unsafe fn op_bit_and(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| a & b) }
}

unsafe fn op_bit_or(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| a | b) }
}

unsafe fn op_bit_xor(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| a ^ b) }
}

unsafe fn op_shl(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| a.wrapping_shl(b as u32)) }
}

unsafe fn op_shr(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| a.wrapping_shr(b as u32)) }
}

unsafe fn op_bit_not(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.unary(|a| !a) }
}

unsafe fn op_lt(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| (a < b) as i32) }
}

unsafe fn op_le(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| (a <= b) as i32) }
}

unsafe fn op_gt(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| (a > b) as i32) }
}

unsafe fn op_ge(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| (a >= b) as i32) }
}

unsafe fn op_eq(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| (a == b) as i32) }
}

unsafe fn op_ne(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.binary(|a, b| (a != b) as i32) }
}

unsafe fn op_not(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe { m.unary(|a| (a == 0) as i32) }
}

unsafe fn op_jump(m: &mut Machine<'_>) -> ControlFlow<i32> {
    m.ip = unsafe { m.immediate() } as usize;
    ControlFlow::Continue(())
}

unsafe fn op_jump_if_false_keep(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe {
        let target = m.immediate() as usize;
        if *m.top() == 0 {
            m.ip = target;
        } else {
            m.pop();
        }
    }
    ControlFlow::Continue(())
}

unsafe fn op_jump_if_true_keep(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe {
        let target = m.immediate() as usize;
        let top = m.top();
        if *top != 0 {
            *top = 1;
            m.ip = target;
        } else {
            m.pop();
        }
    }
    ControlFlow::Continue(())
}

unsafe fn op_jump_if_false_pop(m: &mut Machine<'_>) -> ControlFlow<i32> {
    unsafe {
        let target = m.immediate() as usize;
        if m.pop() == 0 {
            m.ip = target;
        }
    }
    ControlFlow::Continue(())
}

unsafe fn op_return(m: &mut Machine<'_>) -> ControlFlow<i32> {
    debug_assert_eq!(m.sp, 1, "return with unbalanced stack");
    ControlFlow::Break(unsafe { m.pop() })
}

unsafe fn op_invalid(m: &mut Machine<'_>) -> ControlFlow<i32> {
    let offset = m.ip - 1;
    panic!("invalid opcode 0x{:02X} at offset {}", m.code[offset], offset)
}

// ============================================================================
// Dispatch loops
// ============================================================================

unsafe fn run_switch(m: &mut Machine<'_>) -> i32 {
    loop {
        let byte = unsafe { m.fetch() };
        let Some(opcode) = Opcode::from_byte(byte) else {
            panic!("invalid opcode 0x{:02X} at offset {}", byte, m.ip - 1);
        };
        let flow = unsafe {
            match opcode {
                Opcode::Nop => op_nop(m),
                Opcode::PushInt => op_push_int(m),
                Opcode::PushVar => op_push_var(m),
                Opcode::Pop => op_pop(m),
                Opcode::Add => op_add(m),
                Opcode::Sub => op_sub(m),
                Opcode::Mul => op_mul(m),
                Opcode::Div => op_div(m),
                Opcode::Mod => op_mod(m),
                Opcode::Neg => op_neg(m),
                Opcode::BitAnd => op_bit_and(m),
                Opcode::BitOr => op_bit_or(m),
                Opcode::BitXor => op_bit_xor(m),
                Opcode::Shl => op_shl(m),
                Opcode::Shr => op_shr(m),
                Opcode::BitNot => op_bit_not(m),
                Opcode::Lt => op_lt(m),
                Opcode::Le => op_le(m),
                Opcode::Gt => op_gt(m),
                Opcode::Ge => op_ge(m),
                Opcode::Eq => op_eq(m),
                Opcode::Ne => op_ne(m),
                Opcode::Not => op_not(m),
                Opcode::Jump => op_jump(m),
                Opcode::JumpIfFalseKeep => op_jump_if_false_keep(m),
                Opcode::JumpIfTrueKeep => op_jump_if_true_keep(m),
                Opcode::JumpIfFalsePop => op_jump_if_false_pop(m),
                Opcode::Return => op_return(m),
            }
        };
        if let ControlFlow::Break(value) = flow {
            return value;
        }
    }
}

static HANDLERS: [Handler; 256] = build_handler_table();

const fn build_handler_table() -> [Handler; 256] {
    let mut table: [Handler; 256] = [op_invalid as Handler; 256];
    table[Opcode::Nop as usize] = op_nop;
    table[Opcode::PushInt as usize] = op_push_int;
    table[Opcode::PushVar as usize] = op_push_var;
    table[Opcode::Pop as usize] = op_pop;
    table[Opcode::Add as usize] = op_add;
    table[Opcode::Sub as usize] = op_sub;
    table[Opcode::Mul as usize] = op_mul;
    table[Opcode::Div as usize] = op_div;
    table[Opcode::Mod as usize] = op_mod;
    table[Opcode::Neg as usize] = op_neg;
    table[Opcode::BitAnd as usize] = op_bit_and;
    table[Opcode::BitOr as usize] = op_bit_or;
    table[Opcode::BitXor as usize] = op_bit_xor;
    table[Opcode::Shl as usize] = op_shl;
    table[Opcode::Shr as usize] = op_shr;
    table[Opcode::BitNot as usize] = op_bit_not;
    table[Opcode::Lt as usize] = op_lt;
    table[Opcode::Le as usize] = op_le;
    table[Opcode::Gt as usize] = op_gt;
    table[Opcode::Ge as usize] = op_ge;
    table[Opcode::Eq as usize] = op_eq;
    table[Opcode::Ne as usize] = op_ne;
    table[Opcode::Not as usize] = op_not;
    table[Opcode::Jump as usize] = op_jump;
    table[Opcode::JumpIfFalseKeep as usize] = op_jump_if_false_keep;
    table[Opcode::JumpIfTrueKeep as usize] = op_jump_if_true_keep;
    table[Opcode::JumpIfFalsePop as usize] = op_jump_if_false_pop;
    table[Opcode::Return as usize] = op_return;
    table
}

unsafe fn run_threaded(m: &mut Machine<'_>) -> i32 {
    loop {
        let byte = unsafe { m.fetch() };
        let handler = HANDLERS[byte as usize];
        if let ControlFlow::Break(value) = unsafe { handler(m) } {
            return value;
        }
    }
}
