#[macro_use]
mod cases;

test_case!(
    simple_int,
    input: "42",
    value: 42,
);

test_case!(
    int_with_leading_zeros_spaces,
    input: "  007  ",
    value: 7,
);

test_case!(
    negative_int,
    input: "-42",
    value: -42,
);

test_case!(
    min_int_literal,
    input: "-2147483648",
    value: i32::MIN,
);

test_case!(
    max_int_literal,
    input: "2147483647",
    value: i32::MAX,
);

test_case!(
    double_negation,
    input: "-(-5)",
    value: 5,
);

test_case!(
    negate_variable,
    input: "- x",
    bindings: [("x", 8)],
    value: -8,
);

test_case!(
    unary_plus,
    input: "+x + +3",
    bindings: [("x", 4)],
    value: 7,
);

test_case!(
    overflowing_literal,
    input: "2147483648",
    error: minmath::Error::Parse(_),
);

test_case!(
    overflowing_negative_literal,
    input: "-2147483649",
    error: minmath::Error::Parse(_),
);
