//! Tests for the bytecode compiler.

use crate::{
    String, ToString, Vec,
    ast::{BinaryOp, Expr, UnaryOp},
    compiler::{BytecodeCompiler, compile},
    parser,
    vm::{Code, Instruction, execute},
};
use bumpalo::Bump;
use pretty_assertions::assert_eq;

/// Compile a source expression.
fn compile_source(source: &str) -> Code {
    compile(&parser::parse(source).unwrap()).unwrap()
}

/// Decoded instructions, without offsets.
fn listing(code: &Code) -> Vec<Instruction> {
    code.instructions().map(|(_, instruction)| instruction).collect()
}

/// Compile and run with the given bindings.
fn run(source: &str, bindings: &[(&str, i32)]) -> i32 {
    let code = compile_source(source);
    let mut params = code.allocate_parameters();
    for (name, value) in bindings {
        assert!(code.set_param(&mut params, name, *value), "unknown {}", name);
    }
    let mut stack = code.allocate_stack();
    execute(&code, &params, &mut stack)
}

#[test]
fn test_compile_simple_integer() {
    let code = compile_source("42");

    assert_eq!(
        listing(&code),
        [Instruction::PushInt(42), Instruction::Return]
    );
    assert_eq!(code.bytes().len(), 6);
    assert_eq!(code.max_stack(), 1);
    assert_eq!(code.param_count(), 0);
}

#[test]
fn test_compile_addition() {
    let code = compile_source("2 + 3");

    assert_eq!(
        listing(&code),
        [
            Instruction::PushInt(2),
            Instruction::PushInt(3),
            Instruction::Add,
            Instruction::Return
        ]
    );
    assert_eq!(code.max_stack(), 2, "Stack depth should be 2 (two operands)");
}

#[test]
fn test_stack_depth_right_nested() {
    // a + (b * c): `a` stays on the stack while `b * c` needs two slots.
    let code = compile_source("a + b * c");
    assert_eq!(
        listing(&code),
        [
            Instruction::PushVar(0),
            Instruction::PushVar(1),
            Instruction::PushVar(2),
            Instruction::Mul,
            Instruction::Add,
            Instruction::Return
        ]
    );
    assert_eq!(code.max_stack(), 3);
    assert_eq!(code.params(), ["a", "b", "c"]);
}

#[test]
fn test_stack_depth_left_nested() {
    let code = compile_source("a * b + c");
    assert_eq!(code.max_stack(), 2);
}

#[test]
fn test_stack_depth_unary_and_conditional() {
    assert_eq!(compile_source("-~!x").max_stack(), 1);
    assert_eq!(compile_source("c ? a + b * d : e").max_stack(), 3);
    assert_eq!(compile_source("(a + b) ? 1 : 2").max_stack(), 2);
}

#[test]
fn test_repeated_variable_shares_index() {
    let code = compile_source("x * x + y - x");
    assert_eq!(code.params(), ["x", "y"]);
    let vars: Vec<u32> = listing(&code)
        .into_iter()
        .filter_map(|instruction| match instruction {
            Instruction::PushVar(index) => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(vars, [0, 0, 1, 0]);
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_compile_and() {
    let code = compile_source("a && b");
    assert_eq!(
        listing(&code),
        [
            Instruction::PushVar(0),
            Instruction::JumpIfFalseKeep(17),
            Instruction::PushVar(1),
            Instruction::Not,
            Instruction::Not,
            Instruction::Return
        ]
    );
    assert_eq!(code.max_stack(), 1);
}

#[test]
fn test_compile_or_with_boolean_right_operand() {
    // `b < 3` is already 0 or 1: no `Not Not` pair.
    let code = compile_source("a || b < 3");
    assert_eq!(
        listing(&code),
        [
            Instruction::PushVar(0),
            Instruction::JumpIfTrueKeep(21),
            Instruction::PushVar(1),
            Instruction::PushInt(3),
            Instruction::Lt,
            Instruction::Return
        ]
    );
    assert_eq!(code.max_stack(), 2);
}

#[test]
fn test_compile_conditional() {
    let code = compile_source("c ? 1 : 2");
    assert_eq!(
        listing(&code),
        [
            Instruction::PushVar(0),
            Instruction::JumpIfFalsePop(20),
            Instruction::PushInt(1),
            Instruction::Jump(25),
            Instruction::PushInt(2),
            Instruction::Return
        ]
    );
    assert_eq!(code.max_stack(), 1);
}

#[test]
fn test_jump_targets_land_on_instructions() {
    let code = compile_source("a && (b || c ? d : e && f) || !g");
    let starts: Vec<usize> = code.instructions().map(|(offset, _)| offset).collect();
    for (_, instruction) in code.instructions() {
        if let Some(target) = instruction.jump_target() {
            assert!(
                starts.contains(&(target as usize)),
                "target {} is not an instruction start",
                target
            );
        }
    }
}

#[test]
fn test_program_ends_with_return() {
    for source in ["1", "a ? b : c", "a || b", "x / y"] {
        let code = compile_source(source);
        assert_eq!(code.bytes().last(), Some(&(Instruction::Return.opcode() as u8)));
    }
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_scenarios() {
    assert_eq!(run("3 + 4 * 2", &[]), 11);
    assert_eq!(run("(3 + 4) * 2", &[]), 14);
    assert_eq!(run("-(-5)", &[]), 5);
    assert_eq!(run("x ? 10 : 20", &[("x", 0)]), 20);
    assert_eq!(run("x ? 10 : 20", &[("x", 5)]), 10);
}

#[test]
fn test_short_circuit_skips_right_operand() {
    // The right operand would trap if evaluated.
    assert_eq!(run("a && 1 / b", &[("a", 0), ("b", 0)]), 0);
    assert_eq!(run("a || 1 / b", &[("a", 3), ("b", 0)]), 1);
    assert_eq!(run("a && b", &[("a", 4), ("b", -9)]), 1);
    assert_eq!(run("a || b", &[("a", 0), ("b", 0)]), 0);
}

#[test]
#[should_panic]
fn test_division_by_zero_traps() {
    run("a / b", &[("a", 1), ("b", 0)]);
}

#[test]
fn test_nested_control_flow() {
    let source = "a > 0 ? (b && c) + 10 : (b || c) - 10";
    assert_eq!(run(source, &[("a", 1), ("b", 2), ("c", 0)]), 10);
    assert_eq!(run(source, &[("a", 1), ("b", 2), ("c", 3)]), 11);
    assert_eq!(run(source, &[("a", 0), ("b", 0), ("c", 0)]), -10);
    assert_eq!(run(source, &[("a", -1), ("b", 0), ("c", 7)]), -9);
}

// ============================================================================
// Tree representations
// ============================================================================

#[test]
fn test_arena_and_heap_trees_compile_identically() {
    let expr = Expr::if_else(
        Expr::binary(BinaryOp::Or, Expr::var("p"), Expr::var("q")),
        Expr::unary(UnaryOp::Neg, Expr::var("p")),
        Expr::binary(BinaryOp::Shl, Expr::var("q"), Expr::int(3)),
    );
    let arena = Bump::new();
    let node = expr.alloc_in(&arena);

    let heap = BytecodeCompiler::compile(&expr).unwrap();
    let bump = BytecodeCompiler::compile(node).unwrap();
    assert_eq!(heap, bump);
}

#[test]
fn test_disassembly() {
    let code = compile_source("c ? 1 : 2");
    let expected = [
        "   0       PushVar            0 (c)",
        "   5       JumpIfFalsePop     L0",
        "  10       PushInt            1",
        "  15       Jump               L1",
        "  20  L0:  PushInt            2",
        "  25  L1:  Return",
    ];
    let mut text = String::new();
    for line in expected {
        text.push_str(line);
        text.push('\n');
    }
    assert_eq!(code.to_string(), text);
}
