use minmath::{Error, ExecutionError};

#[macro_use]
mod cases;

test_case!(
    precedence_mul_over_add,
    input: "3 + 4 * 2",
    value: 11,
);

test_case!(
    parentheses_override_precedence,
    input: "(3 + 4) * 2",
    value: 14,
);

test_case!(
    left_associative_subtraction,
    input: "10 - 4 - 3",
    value: 3,
);

test_case!(
    division_truncates_toward_zero,
    input: "a / b",
    bindings: [("a", -7), ("b", 2)],
    value: -3,
);

test_case!(
    remainder_takes_sign_of_dividend,
    input: "a % b",
    bindings: [("a", -7), ("b", 2)],
    value: -1,
);

test_case!(
    addition_wraps,
    input: "x + 1",
    bindings: [("x", i32::MAX)],
    value: i32::MIN,
);

test_case!(
    multiplication_wraps,
    input: "x * x",
    bindings: [("x", 65536)],
    value: 0,
);

test_case!(
    min_divided_by_minus_one_wraps,
    input: "x / -1",
    bindings: [("x", i32::MIN)],
    value: i32::MIN,
);

test_case!(
    negating_min_wraps,
    input: "-x",
    bindings: [("x", i32::MIN)],
    value: i32::MIN,
);

test_case!(
    bitwise_operators,
    input: "(a & 12) | (a ^ 5) | ~b",
    bindings: [("a", 10), ("b", -1)],
    value: 15,
);

test_case!(
    shift_below_addition,
    input: "1 << 2 + 1",
    value: 8,
);

test_case!(
    arithmetic_shift_right,
    input: "x >> 2",
    bindings: [("x", -16)],
    value: -4,
);

test_case!(
    shift_count_is_masked,
    input: "1 << n",
    bindings: [("n", 33)],
    value: 2,
);

test_case!(
    strength_reduced_multiply,
    input: "x * 8 + x * -2147483648",
    bindings: [("x", 3)],
    value: 24 + i32::MIN,
);

test_case!(
    repeated_variable,
    input: "x * x + y - x",
    bindings: [("x", 3), ("y", 4)],
    value: 10,
);

test_case!(
    optimize_identities,
    input: "(x + 0) * 1 - 0",
    optimized: "x",
);

test_case!(
    optimize_constant_folding,
    input: "(x + 0) * 8 + 2 * 3",
    optimized: "((x << 3) + 6)",
);

test_case!(
    division_by_zero,
    input: "a / b",
    bindings: [("a", 1), ("b", 0)],
    error: Error::Runtime(ExecutionError::DivisionByZero),
);

test_case!(
    literal_division_by_zero_is_not_folded,
    input: "7 % 0",
    error: Error::Runtime(ExecutionError::DivisionByZero),
);

test_case!(
    unbound_variable,
    input: "a + b",
    bindings: [("a", 1)],
    error: Error::Runtime(ExecutionError::UnboundVariable { .. }),
);
