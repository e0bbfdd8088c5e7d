//! Tree-walking evaluator for compiled Kiln scripts.
//!
//! ## Design Principles
//!
//! - **Never panic**: all adversarial inputs end in an [`EvaluationError`].
//! - **Stack-safe**: depth tracking and a native stack budget turn runaway
//!   recursion into a fault.
//! - **Isolated**: the compiled tree is only read. Counters belong to one
//!   call; scopes and their arena belong to one function activation and are
//!   dropped when it returns.

mod error;
mod eval;
pub(crate) mod operators;

#[cfg(test)]
mod eval_test;

pub use error::{EvaluationError, RuntimeFault};

use tracing::trace;

use crate::api::{Binding, CompiledScript, ExecutionOptions};
use crate::values::Value;

/// Evaluate `script` against `binding`.
///
/// Every free variable of the script must be bound; the first missing one,
/// in sorted order, is reported as [`EvaluationError::UnboundSymbol`] before
/// anything runs. Extra entries in the binding are ignored.
///
/// The binding is consumed: it is visible to this call only and is dropped
/// when the call returns.
///
/// ## Example
///
/// ```
/// use kiln_core::api::{Binding, Engine, ExecutionOptions};
/// use kiln_core::evaluator::evaluate;
///
/// let script = Engine::default().compile("example", "(+ 1 x)").unwrap();
///
/// let err = evaluate(&script, Binding::empty(), &ExecutionOptions::default()).unwrap_err();
/// assert!(err.is_unbound_symbol());
/// ```
pub fn evaluate(
    script: &CompiledScript,
    binding: Binding,
    options: &ExecutionOptions,
) -> Result<Value, EvaluationError> {
    if let Some(missing) = script
        .free_variable_spans()
        .iter()
        .find(|variable| !binding.contains(&variable.name))
    {
        trace!(script = script.name(), name = %missing.name, "Unbound symbol");
        return Err(EvaluationError::UnboundSymbol {
            script: script.name_ref().clone(),
            name: missing.name.clone(),
            span: missing.span.clone(),
        });
    }

    trace!(script = script.name(), bound = binding.len(), "Evaluating");
    let result = eval::Evaluator::new(options, script.name_ref(), &binding).run(script.body());
    trace!(script = script.name(), ok = result.is_ok(), "Evaluated");
    result
}
