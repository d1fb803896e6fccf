//! Compiled expressions.

use super::{Error, ExecutionOptions};
use crate::evaluator::{Bindings, ExecutionError};
use crate::vm::{self, Code};
use crate::{ToString, Vec};

/// A compiled expression together with its parameter and stack buffers.
///
/// Buffers are allocated once at compile time, so running the expression
/// repeatedly does not allocate. Parameters keep their values between runs.
///
/// # Execution Tiers
///
/// - **`run()`** with `checked: false`: the unchecked VM loop. Division or
///   modulo by zero traps (panics).
/// - **`run()`** with `checked: true`, or **`run_checked()`**: the
///   bounds-checked interpreter, which reports every failure as an error.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    code: Code,
    params: Vec<i32>,
    stack: Vec<i32>,
    options: ExecutionOptions,
}

impl CompiledExpression {
    /// Create a new compiled expression.
    ///
    /// This is called internally by Engine::compile().
    pub(crate) fn new(code: Code, options: ExecutionOptions) -> Self {
        let params = code.allocate_parameters();
        let stack = code.allocate_stack();
        Self {
            code,
            params,
            stack,
            options,
        }
    }

    /// The compiled program.
    pub fn code(&self) -> &Code {
        &self.code
    }

    /// Parameter names in index order.
    pub fn param_names(&self) -> &[crate::String] {
        self.code.params()
    }

    /// Current parameter values, in the same order as [`Self::param_names`].
    pub fn param_values(&self) -> &[i32] {
        &self.params
    }

    /// Set the value of one parameter.
    pub fn set(&mut self, name: &str, value: i32) -> Result<(), Error> {
        if self.code.set_param(&mut self.params, name, value) {
            Ok(())
        } else {
            Err(Error::UnknownParameter {
                name: name.to_string(),
            })
        }
    }

    /// Set every parameter from `bindings`.
    ///
    /// Fails with [`ExecutionError::UnboundVariable`] on the first parameter
    /// `bindings` has no value for; parameters before it are already updated.
    /// Extra bindings are ignored.
    pub fn bind<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<(), Error> {
        for (slot, name) in self.params.iter_mut().zip(self.code.params()) {
            *slot = bindings
                .get(name)
                .ok_or_else(|| ExecutionError::UnboundVariable { name: name.clone() })?;
        }
        Ok(())
    }

    /// Execute with the options chosen at compile time.
    ///
    /// # Panics
    ///
    /// With `checked: false`, panics on division or modulo by zero.
    pub fn run(&mut self) -> Result<i32, Error> {
        self.run_with(self.options)
    }

    /// Execute with explicit options.
    pub fn run_with(&mut self, options: ExecutionOptions) -> Result<i32, Error> {
        if options.checked {
            return self.run_checked();
        }
        Ok(vm::execute_with(
            &self.code,
            &self.params,
            &mut self.stack,
            options.dispatch,
        ))
    }

    /// Execute through the bounds-checked interpreter.
    pub fn run_checked(&mut self) -> Result<i32, Error> {
        Ok(vm::execute_checked(&self.code, &self.params, &mut self.stack)?)
    }
}
