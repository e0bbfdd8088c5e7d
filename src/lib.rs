//! Kiln - an embeddable Lisp with a compile-once, evaluate-many contract
//!
//! # Overview
//!
//! A host compiles a script once into an immutable [`CompiledScript`] and
//! then evaluates it as often as it likes, from as many threads as it likes,
//! each time against a fresh [`Binding`] that supplies the script's free
//! variables. Common use cases include:
//!
//! - Routing and filtering rules
//! - Feature flags and conditional logic
//! - Small data transformations
//!
//! # Quick Start
//!
//! ```
//! use kiln::{Binding, Value};
//!
//! let script = kiln::compile("example", "(+ 1 x)").unwrap();
//! let result = kiln::evaluate(&script, Binding::from_pairs([("x", 5)]).unwrap());
//! assert_eq!(result, Ok(Value::Int(6)));
//! ```
//!
//! # Host Functions
//!
//! Engines built with [`Engine::new`] start empty; register the standard
//! library and any host functions in the init closure:
//!
//! ```
//! use kiln::{Arity, Binding, Engine, EngineOptions, RuntimeFault, Value};
//! use kiln::stdlib::register_stdlib;
//!
//! let engine = Engine::new(EngineOptions::default(), |env| {
//!     register_stdlib(env)?;
//!     env.category("Host");
//!     env.function("twice", Arity::Exact(1), "Doubles an integer", |args| {
//!         let n = args[0].as_int().ok_or_else(|| {
//!             RuntimeFault::type_mismatch("twice", "an integer", args[0].type_name())
//!         })?;
//!         Ok(Value::Int(n.saturating_mul(2)))
//!     })?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let script = engine.compile("host", "(twice (inc n))").unwrap();
//! let result = kiln::evaluate(&script, Binding::from_pairs([("n", 20)]).unwrap());
//! assert_eq!(result, Ok(Value::Int(42)));
//! ```

mod error_renderer;

use once_cell::sync::Lazy;

// Re-export public API from kiln_core
pub use kiln_core::api::{
    Binding, CompilationOptions, CompileError, CompiledScript, Diagnostic, Engine, EngineOptions,
    Environment, EnvironmentBuilder, EnvironmentError, Error, EvaluationError, ExecutionOptions,
    FunctionDoc, InvalidBindingError, Program, RelatedInfo, RuntimeFault, Severity,
};
pub use kiln_core::section::Section;
pub use kiln_core::stdlib;
pub use kiln_core::values::{self, Arity, Function, NativeFunction, Value};

pub use error_renderer::{
    render_compile_error, render_compile_error_to_string,
    render_compile_error_to_string_no_color, render_evaluation_error,
    render_evaluation_error_to_string, render_evaluation_error_to_string_no_color,
};

static DEFAULT_ENGINE: Lazy<Engine> = Lazy::new(Engine::default);

/// Compile `source` with the default engine (standard library, default
/// options).
pub fn compile(name: &str, source: &str) -> Result<CompiledScript, CompileError> {
    DEFAULT_ENGINE.compile(name, source)
}

/// Evaluate `script` against `binding` with default execution options.
pub fn evaluate(script: &CompiledScript, binding: Binding) -> Result<Value, EvaluationError> {
    kiln_core::evaluator::evaluate(script, binding, &ExecutionOptions::default())
}
