//! Shared harness for the integration tests.
//!
//! Every `value:` case runs the expression through the tree evaluator and
//! through the VM under each combination of compilation passes and dispatch
//! strategy, and requires all of them to agree.

#![allow(dead_code)]

use minmath::{
    CompilationOptions, Dispatch, Engine, EngineOptions, Error, ExecutionOptions, eval, optimize,
    parse,
};
use pretty_assertions::assert_eq;

pub const PASSES: [CompilationOptions; 4] = [
    CompilationOptions {
        optimize: false,
        peephole: false,
    },
    CompilationOptions {
        optimize: true,
        peephole: false,
    },
    CompilationOptions {
        optimize: false,
        peephole: true,
    },
    CompilationOptions {
        optimize: true,
        peephole: true,
    },
];

pub const EXECUTIONS: [ExecutionOptions; 3] = [
    ExecutionOptions {
        dispatch: Dispatch::Switch,
        checked: false,
    },
    ExecutionOptions {
        dispatch: Dispatch::Threaded,
        checked: false,
    },
    ExecutionOptions {
        dispatch: Dispatch::Switch,
        checked: true,
    },
];

/// Evaluate `input` every way there is and return the common result.
pub fn check_value(input: &str, bindings: &[(&str, i32)], expected: i32) {
    let tree = parse(input).unwrap_or_else(|e| panic!("`{}` failed to parse: {}", input, e));
    assert_eq!(eval(&tree, bindings), Ok(expected), "tree evaluation of `{}`", input);
    assert_eq!(
        eval(&optimize(&tree), bindings),
        Ok(expected),
        "optimized tree of `{}`",
        input
    );

    let engine = Engine::new(EngineOptions::default());
    for passes in PASSES {
        let mut expr = engine.compile_with(&tree, passes).unwrap();
        expr.bind(bindings).unwrap();
        for execution in EXECUTIONS {
            assert_eq!(
                expr.run_with(execution),
                Ok(expected),
                "`{}` with {:?} and {:?}",
                input,
                passes,
                execution
            );
        }
    }
}

/// Compile `input` with checked execution and return the error it reports.
pub fn check_error(input: &str, bindings: &[(&str, i32)]) -> Error {
    let engine = Engine::new(EngineOptions {
        default_execution_options: ExecutionOptions {
            checked: true,
            ..Default::default()
        },
        ..Default::default()
    });
    let result = engine.compile_source(input).and_then(|mut expr| {
        expr.bind(bindings)?;
        expr.run()
    });
    match result {
        Ok(value) => panic!("`{}` should fail, got {}", input, value),
        Err(err) => err,
    }
}

/// Declare an integration test case.
///
/// ```ignore
/// test_case!(
///     name,
///     input: "a + 1",
///     bindings: [("a", 41)],
///     value: 42,
/// );
///
/// test_case!(
///     name,
///     input: "x * 1",
///     optimized: "x",
/// );
///
/// test_case!(
///     name,
///     input: "1 / 0",
///     error: Error::Runtime(ExecutionError::DivisionByZero),
/// );
/// ```
macro_rules! test_case {
    (
        $name:ident,
        input: $input:expr,
        $(bindings: [$(($var:expr, $val:expr)),* $(,)?],)?
        value: $value:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let bindings: &[(&str, i32)] = &[$($(($var, $val)),*)?];
            $crate::cases::check_value($input, bindings, $value);
        }
    };
    (
        $name:ident,
        input: $input:expr,
        optimized: $optimized:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let tree = minmath::parse($input).unwrap();
            assert_eq!(minmath::optimize(&tree).to_string(), $optimized);
        }
    };
    (
        $name:ident,
        input: $input:expr,
        $(bindings: [$(($var:expr, $val:expr)),* $(,)?],)?
        error: $pattern:pat $(,)?
    ) => {
        #[test]
        fn $name() {
            let bindings: &[(&str, i32)] = &[$($(($var, $val)),*)?];
            let err = $crate::cases::check_error($input, bindings);
            assert!(matches!(err, $pattern), "unexpected error: {:?}", err);
        }
    };
}
