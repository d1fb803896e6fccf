//! Bytecode compiler implementation.

use hashbrown::HashMap;

use super::Fault;
use crate::{
    String, Vec,
    ast::BinaryOp,
    format,
    visitor::{ExprKind, TreeTransformer, TreeView},
    vm::{Code, IMMEDIATE_SIZE, Instruction},
};

/// Bytecode compiler that transforms expression trees into VM bytecode.
///
/// The compiler implements the TreeTransformer pattern to traverse the tree
/// and emit bytecode instructions. Transforming a node returns the maximum
/// operand stack depth needed to evaluate it.
pub struct BytecodeCompiler<'t> {
    /// Encoded instruction stream
    instructions: Vec<u8>,

    /// Parameter names in index order
    params: Vec<String>,

    /// Parameter name -> index
    param_map: HashMap<&'t str, u32>,
}

impl<'t> BytecodeCompiler<'t> {
    /// Create a new bytecode compiler.
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            params: Vec::new(),
            param_map: HashMap::new(),
        }
    }

    /// Convenience method to compile a tree in one call.
    pub fn compile<T: TreeView<'t>>(tree: T) -> Result<Code, Fault> {
        let mut compiler = Self::new();
        let max_stack = compiler.transform(tree)?;
        // Emit Return instruction to signal end of execution
        compiler.emit(Instruction::Return)?;
        Ok(compiler.finalize(max_stack))
    }

    /// Finalize compilation and return the program.
    pub fn finalize(self, max_stack: usize) -> Code {
        Code::from_parts(self.instructions, self.params, max_stack)
    }

    // === Instruction Emission ===

    /// Emit an instruction, returning its offset.
    fn emit(&mut self, instruction: Instruction) -> Result<usize, Fault> {
        let offset = self.instructions.len();
        let end = offset
            .checked_add(instruction.size())
            .filter(|&end| u32::try_from(end).is_ok())
            .ok_or(Fault::Memory)?;
        self.instructions
            .try_reserve(end - offset)
            .map_err(|_| Fault::Memory)?;
        instruction.encode(&mut self.instructions);
        Ok(offset)
    }

    // === Parameters ===

    /// Index of `name`, registering it on first use.
    fn param(&mut self, name: &'t str) -> Result<u32, Fault> {
        if let Some(&index) = self.param_map.get(name) {
            return Ok(index);
        }

        let index = u32::try_from(self.params.len()).map_err(|_| Fault::Memory)?;
        let mut owned = String::new();
        owned.try_reserve_exact(name.len()).map_err(|_| Fault::Memory)?;
        owned.push_str(name);
        self.params.try_reserve(1).map_err(|_| Fault::Memory)?;
        self.param_map.try_reserve(1).map_err(|_| Fault::Memory)?;

        self.params.push(owned);
        self.param_map.insert(name, index);
        Ok(index)
    }

    // === Jump Patching Infrastructure ===

    /// Emit a jump with a placeholder target and return the position of its
    /// immediate, for use with `patch_jump`.
    fn jump_placeholder(&mut self, make_jump: fn(u32) -> Instruction) -> Result<usize, Fault> {
        let offset = self.emit(make_jump(0))?;
        Ok(offset + 1)
    }

    /// Get the current offset (for use as a jump label).
    fn label(&self) -> u32 {
        // `emit` keeps the stream length within u32.
        self.instructions.len() as u32
    }

    /// Overwrite a placeholder immediate with `target`.
    fn patch_jump(&mut self, immediate: usize, target: u32) {
        self.instructions[immediate..immediate + IMMEDIATE_SIZE]
            .copy_from_slice(&target.to_le_bytes());
    }
}

impl Default for BytecodeCompiler<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'t, T: TreeView<'t>> TreeTransformer<'t, T> for BytecodeCompiler<'t> {
    /// Maximum stack depth of the subtree.
    type Output = Result<usize, Fault>;

    fn transform(&mut self, tree: T) -> Self::Output {
        match tree.view() {
            // === Leaves ===
            ExprKind::Int(value) => {
                self.emit(Instruction::PushInt(value))?;
                Ok(1)
            }

            ExprKind::Var(name) => {
                let index = self.param(name)?;
                self.emit(Instruction::PushVar(index))?;
                Ok(1)
            }

            // === Unary Operations ===
            ExprKind::Unary(op, expr) => {
                let depth = self.transform(expr)?;
                self.emit(Instruction::from_unary(op))?;
                Ok(depth)
            }

            // === Short-circuit Operations ===
            ExprKind::Binary(op @ (BinaryOp::And | BinaryOp::Or), left, right) => {
                let left_depth = self.transform(left)?;

                // The jump leaves the canonical result (0 for &&, 1 for ||)
                // on the stack; otherwise it pops the left operand.
                let end_jump = self.jump_placeholder(if op == BinaryOp::And {
                    Instruction::JumpIfFalseKeep
                } else {
                    Instruction::JumpIfTrueKeep
                })?;

                let right_depth = self.transform(right)?;
                if !right.view().is_boolean() {
                    // Canonicalize the right operand to 0 or 1.
                    self.emit(Instruction::Not)?;
                    self.emit(Instruction::Not)?;
                }

                let end_label = self.label();
                self.patch_jump(end_jump, end_label);

                Ok(left_depth.max(right_depth))
            }

            // === Binary Operations ===
            ExprKind::Binary(op, left, right) => {
                let instruction =
                    Instruction::from_binary(op).ok_or_else(|| Fault::InternalInvariant {
                        message: format!("no instruction for operator `{}`", op.symbol()),
                    })?;

                let left_depth = self.transform(left)?;
                // The left result stays on the stack while the right is computed
                let right_depth = self.transform(right)? + 1;
                self.emit(instruction)?;

                Ok(left_depth.max(right_depth))
            }

            // === Conditionals ===
            ExprKind::If(cond, then_branch, else_branch) => {
                // Condition is consumed by JumpIfFalsePop
                let cond_depth = self.transform(cond)?;
                let else_jump = self.jump_placeholder(Instruction::JumpIfFalsePop)?;

                // Only one branch executes at runtime, so they share the same
                // stack space.
                let then_depth = self.transform(then_branch)?;
                let end_jump = self.jump_placeholder(Instruction::Jump)?;

                let else_label = self.label();
                self.patch_jump(else_jump, else_label);

                let else_depth = self.transform(else_branch)?;

                let end_label = self.label();
                self.patch_jump(end_jump, end_label);

                Ok(cond_depth.max(then_depth).max(else_depth))
            }
        }
    }
}
