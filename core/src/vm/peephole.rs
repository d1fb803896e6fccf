//! Bytecode peephole optimizer.
//!
//! Collapses jump chains: every jump whose target is an unconditional `Jump`
//! is retargeted to the end of the chain. An unconditional `Jump` whose chain
//! ends in `Return` is replaced by a `Return`, padded with `Nop`s to keep all
//! offsets stable.
//!
//! The pass works on a copy of the instruction stream and only commits it on
//! success, so a [`Code`] is never left half rewritten.

use hashbrown::HashMap;

use super::Code;
use super::instruction_set::{IMMEDIATE_SIZE, Instruction, Instructions, Opcode};
use crate::compiler::Fault;
use crate::{Vec, format};

/// Collapse jump chains in `code`.
///
/// Running the pass twice yields byte-identical output.
pub fn peephole_optimize(code: &mut Code) -> Result<(), Fault> {
    let mut bytes = code.bytes().to_vec();

    let decoded = Instructions::new(&bytes)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| Fault::InternalInvariant {
            message: format!("peephole: {}", error),
        })?;
    let at: HashMap<usize, Instruction> = decoded.iter().copied().collect();

    let mut retargeted = 0usize;
    let mut fused = 0usize;

    for &(offset, instruction) in &decoded {
        let Some(target) = instruction.jump_target() else {
            continue;
        };
        let target = target as usize;
        let destination = resolve(&at, offset, target)?;

        if instruction.opcode() == Opcode::Jump
            && matches!(at.get(&destination), Some(Instruction::Return))
        {
            bytes[offset] = Opcode::Return as u8;
            bytes[offset + 1..offset + 1 + IMMEDIATE_SIZE].fill(Opcode::Nop as u8);
            tracing::trace!(offset, "Replaced jump to return");
            fused += 1;
        } else if destination != target {
            let destination = destination as u32;
            bytes[offset + 1..offset + 1 + IMMEDIATE_SIZE]
                .copy_from_slice(&destination.to_le_bytes());
            tracing::trace!(offset, from = target, to = destination, "Retargeted jump");
            retargeted += 1;
        }
    }

    tracing::debug!(retargeted, fused, "Peephole pass finished");
    code.set_bytes(bytes);
    Ok(())
}

/// Follow a chain of unconditional jumps starting at `target`.
fn resolve(at: &HashMap<usize, Instruction>, site: usize, target: usize) -> Result<usize, Fault> {
    let mut current = target;
    // A chain longer than the program must revisit an instruction.
    for _ in 0..=at.len() {
        match at.get(&current) {
            Some(Instruction::Jump(next)) => current = *next as usize,
            Some(_) => return Ok(current),
            None => {
                return Err(Fault::InternalInvariant {
                    message: format!(
                        "peephole: jump at offset {} reaches {}, which is not an instruction",
                        site, current
                    ),
                });
            }
        }
    }
    Err(Fault::InternalInvariant {
        message: format!("peephole: jump cycle through offset {}", site),
    })
}
