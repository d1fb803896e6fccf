use indoc::indoc;

#[macro_use]
mod cases;

test_case!(
    trailing_comment,
    input: "1 + 2 # three",
    value: 3,
);

test_case!(
    comment_between_operands,
    input: indoc! {"
        width    # the horizontal extent
          * height # the vertical extent
    "},
    bindings: [("width", 6), ("height", 7)],
    value: 42,
);

test_case!(
    multiline_conditional,
    input: indoc! {"
        # clamp x to [0, 100]
        x < 0
            ? 0
            : x > 100 ? 100 : x
    "},
    bindings: [("x", 250)],
    value: 100,
);
