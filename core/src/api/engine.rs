//! The compilation engine.

use super::{CompilationOptions, CompiledExpression, EngineOptions, Error};
use crate::visitor::TreeView;
use crate::{compiler, optimizer, parser, vm};

/// Turns trees or source text into [`CompiledExpression`]s.
///
/// The engine only carries configuration; compiled expressions own all of
/// their data and do not borrow from it.
///
/// # Example
///
/// ```
/// use minmath_core::api::{CompilationOptions, Engine, EngineOptions};
/// use minmath_core::parser;
///
/// let engine = Engine::new(EngineOptions::default());
/// let tree = parser::parse("(a + 0) * 4").unwrap();
///
/// let fast = engine.compile(&tree).unwrap();
/// let plain = engine
///     .compile_with(&tree, CompilationOptions::unoptimized())
///     .unwrap();
/// assert!(fast.code().bytes().len() < plain.code().bytes().len());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: EngineOptions,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compile a tree with the engine's default compilation options.
    pub fn compile<'t, T: TreeView<'t>>(&self, tree: T) -> Result<CompiledExpression, Error> {
        self.compile_with(tree, self.options.default_compilation_options)
    }

    /// Compile a tree with explicit compilation options.
    ///
    /// The input tree is never modified; the tree optimizer works on a copy.
    pub fn compile_with<'t, T: TreeView<'t>>(
        &self,
        tree: T,
        options: CompilationOptions,
    ) -> Result<CompiledExpression, Error> {
        let mut code = if options.optimize {
            compiler::compile(&optimizer::optimize(tree))?
        } else {
            compiler::compile(tree)?
        };

        if options.peephole {
            vm::peephole_optimize(&mut code)?;
        }

        Ok(CompiledExpression::new(
            code,
            self.options.default_execution_options,
        ))
    }

    /// Parse and compile source text.
    pub fn compile_source(&self, source: &str) -> Result<CompiledExpression, Error> {
        let tree = parser::parse(source)?;
        self.compile(&tree)
    }
}
