//! Public API for the Kiln scripting engine.
//!
//! The API follows the compile-once / evaluate-many contract:
//!
//! 1. **Compile**: an [`Engine`] turns source text into an immutable
//!    [`CompiledScript`]. All syntax and name-resolution errors surface here.
//! 2. **Bind**: a [`Binding`] is built fresh for each call.
//! 3. **Evaluate**: the script runs against the binding. Per-call state lives
//!    and dies inside the call, so one script can be evaluated from many
//!    threads at once.
//!
//! # Example
//!
//! ```
//! use kiln_core::api::{Binding, Engine, Error, Program};
//! use kiln_core::values::Value;
//!
//! fn run() -> Result<Value, Error> {
//!     let engine = Engine::default();
//!     let program = Program::compile(&engine, "area", "(* PI r r)")?;
//!     let binding = Binding::from_pairs([("r", 2.0)])?;
//!     Ok(program.evaluate(binding)?)
//! }
//!
//! let area = run().unwrap().as_float().unwrap();
//! assert!((area - 12.566).abs() < 0.001);
//! ```

pub mod binding;
pub mod engine;
pub mod environment;
pub mod error;
pub mod expression;
pub mod options;
pub mod program;

pub use binding::{Binding, InvalidBindingError};
pub use engine::Engine;
pub use environment::{Environment, EnvironmentBuilder, FunctionDoc};
pub use error::{
    CompileError, Diagnostic, EnvironmentError, Error, EvaluationError, RelatedInfo, RuntimeFault,
    Severity,
};
pub use expression::CompiledScript;
pub use options::{CompilationOptions, EngineOptions, ExecutionOptions};
pub use program::Program;
