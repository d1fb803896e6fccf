use core::fmt;

use hashbrown::HashMap;

use super::instruction_set::{Instruction, Instructions};
use crate::{String, Vec, format, vec};

/// A compiled program.
///
/// Holds the encoded instruction stream, the parameter table and the maximum
/// operand stack depth. Values of this type are only produced by the compiler
/// and only rewritten by the peephole pass, so every jump lands on an
/// instruction start, every `PushVar` index is in range and `max_stack` is an
/// upper bound on the stack depth of any execution.
#[derive(Clone, PartialEq, Eq)]
pub struct Code {
    instructions: Vec<u8>,
    params: Vec<String>,
    max_stack: usize,
}

impl Code {
    pub(crate) fn from_parts(instructions: Vec<u8>, params: Vec<String>, max_stack: usize) -> Self {
        Self {
            instructions,
            params,
            max_stack,
        }
    }

    pub(crate) fn set_bytes(&mut self, instructions: Vec<u8>) {
        self.instructions = instructions;
    }

    /// The encoded instruction stream.
    pub fn bytes(&self) -> &[u8] {
        &self.instructions
    }

    /// Decode the instruction stream, yielding `(offset, instruction)` pairs.
    pub fn instructions(&self) -> impl Iterator<Item = (usize, Instruction)> + '_ {
        Instructions::new(&self.instructions).map_while(Result::ok)
    }

    /// Parameter names, in index order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Maximum number of operand stack slots any execution needs.
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    /// Index of the parameter called `name`.
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|param| param == name)
    }

    /// Store `value` in the slot for `name`. Returns `false` if the program
    /// has no such parameter or `params` is too short.
    pub fn set_param(&self, params: &mut [i32], name: &str, value: i32) -> bool {
        match self.param_index(name).and_then(|index| params.get_mut(index)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// A zeroed parameter buffer of the right size.
    pub fn allocate_parameters(&self) -> Vec<i32> {
        vec![0; self.params.len()]
    }

    /// A zeroed stack buffer of the right size.
    pub fn allocate_stack(&self) -> Vec<i32> {
        vec![0; self.max_stack]
    }

    /// Assign a label number to every jump target, in address order.
    fn labels(&self) -> HashMap<usize, usize> {
        let mut targets: Vec<usize> = self
            .instructions()
            .filter_map(|(_, instruction)| instruction.jump_target())
            .map(|target| target as usize)
            .collect();
        targets.sort_unstable();
        targets.dedup();
        targets
            .into_iter()
            .enumerate()
            .map(|(label, addr)| (addr, label))
            .collect()
    }
}

/// Disassembly listing: offset, label, mnemonic and resolved operands.
impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self.labels();

        for (addr, instruction) in self.instructions() {
            let label_prefix = labels
                .get(&addr)
                .map(|label| format!("L{}:", label))
                .unwrap_or_default();

            match instruction {
                Instruction::PushVar(index) => {
                    let name = self
                        .params
                        .get(index as usize)
                        .map(String::as_str)
                        .unwrap_or("?");
                    writeln!(f, "{:4} {:>4}  {} ({})", addr, label_prefix, instruction, name)?;
                }
                _ => match instruction.jump_target() {
                    Some(target) => {
                        let target_label = labels
                            .get(&(target as usize))
                            .map(|label| format!("L{}", label))
                            .unwrap_or_else(|| format!("@{}", target));
                        writeln!(
                            f,
                            "{:4} {:>4}  {:18} {}",
                            addr,
                            label_prefix,
                            instruction.opcode().mnemonic(),
                            target_label
                        )?;
                    }
                    None => writeln!(f, "{:4} {:>4}  {}", addr, label_prefix, instruction)?,
                },
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Code {{")?;
        writeln!(f, "  params: {:?}", self.params)?;
        writeln!(f, "  max_stack: {}", self.max_stack)?;
        writeln!(f, "  instructions:")?;
        for line in format!("{}", self).lines() {
            writeln!(f, "    {}", line)?;
        }
        write!(f, "}}")
    }
}
