//! Compile once, evaluate many times.

use super::{Binding, CompileError, CompiledScript, Engine, ExecutionOptions};
use crate::evaluator::{self, EvaluationError};
use crate::values::Value;

/// A compiled script together with the execution options it runs under.
///
/// `Program` is the usual entry point for hosts: compile once, keep the
/// program around (or clone it into worker threads), and call
/// [`Program::evaluate`] with a fresh [`Binding`] for every request. Nothing
/// is cached between calls.
///
/// # Example
///
/// ```
/// use kiln_core::api::{Binding, Engine, Program};
/// use kiln_core::values::Value;
///
/// let engine = Engine::default();
/// let program = Program::compile(&engine, "example", "(+ 1 x)").unwrap();
///
/// for x in 0..3 {
///     let result = program.evaluate(Binding::from_pairs([("x", x)]).unwrap());
///     assert_eq!(result, Ok(Value::Int(x + 1)));
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    script: CompiledScript,
    options: ExecutionOptions,
}

static_assertions::assert_impl_all!(Program: Send, Sync, Clone);

impl Program {
    /// Compile `source` with `engine`, snapshotting its default execution
    /// options.
    pub fn compile(engine: &Engine, name: &str, source: &str) -> Result<Self, CompileError> {
        let script = engine.compile(name, source)?;
        Ok(Self::new(
            script,
            engine.options().default_execution_options.clone(),
        ))
    }

    /// Wrap an already compiled script.
    pub fn new(script: CompiledScript, options: ExecutionOptions) -> Self {
        Self { script, options }
    }

    pub fn script(&self) -> &CompiledScript {
        &self.script
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Evaluate against `binding`, which is consumed by the call.
    pub fn evaluate(&self, binding: Binding) -> Result<Value, EvaluationError> {
        evaluator::evaluate(&self.script, binding, &self.options)
    }

    /// Evaluate with options overriding the program's own for this call.
    pub fn evaluate_with(
        &self,
        options: &ExecutionOptions,
        binding: Binding,
    ) -> Result<Value, EvaluationError> {
        evaluator::evaluate(&self.script, binding, options)
    }
}
