//! Evaluation errors.
//!
//! Exactly two classes of failure leave an evaluation:
//!
//! - **Unbound symbol**: the script reads a free variable the binding does
//!   not provide.
//! - **Runtime fault**: the script itself failed (division by zero, a type
//!   mismatch in a built-in, a resource limit, a host function error, ...).
//!
//! Both are scoped to the failing call and carry the span of the offending
//! node so hosts can render them against the source they compiled.

use std::time::Duration;

use ecow::EcoString;
use thiserror::Error;

use crate::api::{Diagnostic, RelatedInfo, Severity};
use crate::parser::Span;
use crate::values::Arity;

/// Failure of one `evaluate` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("unbound symbol `{name}` in script `{script}`")]
    UnboundSymbol {
        script: EcoString,
        name: EcoString,
        span: Span,
    },

    #[error("runtime fault in script `{script}`: {cause}")]
    RuntimeFault {
        script: EcoString,
        #[source]
        cause: RuntimeFault,
        span: Span,
    },
}

impl EvaluationError {
    pub fn script(&self) -> &EcoString {
        match self {
            EvaluationError::UnboundSymbol { script, .. }
            | EvaluationError::RuntimeFault { script, .. } => script,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            EvaluationError::UnboundSymbol { span, .. }
            | EvaluationError::RuntimeFault { span, .. } => span,
        }
    }

    /// The underlying fault, if this is a runtime fault.
    pub fn fault(&self) -> Option<&RuntimeFault> {
        match self {
            EvaluationError::RuntimeFault { cause, .. } => Some(cause),
            EvaluationError::UnboundSymbol { .. } => None,
        }
    }

    pub fn is_unbound_symbol(&self) -> bool {
        matches!(self, EvaluationError::UnboundSymbol { .. })
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            EvaluationError::UnboundSymbol { name, span, .. } => Diagnostic {
                severity: Severity::Error,
                message: format!("Unbound symbol '{}'", name),
                span: span.clone(),
                related: Vec::new(),
                help: vec![format!("Add '{}' to the binding passed to evaluate", name)],
                code: Some("R001".to_string()),
            },
            EvaluationError::RuntimeFault { cause, span, .. } => Diagnostic {
                severity: Severity::Error,
                message: cause.to_string(),
                span: span.clone(),
                related: cause
                    .function()
                    .map(|name| RelatedInfo {
                        span: span.clone(),
                        message: format!("in call to function '{}'", name),
                    })
                    .into_iter()
                    .collect(),
                help: Vec::new(),
                code: Some(cause.code().to_string()),
            },
        }
    }
}

/// Cause of a runtime fault.
///
/// Host functions registered through the environment return this type; most
/// of them only ever need [`RuntimeFault::TypeMismatch`] or
/// [`RuntimeFault::custom`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeFault {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow in '{function}'")]
    IntegerOverflow { function: EcoString },

    #[error("'{function}' expected {expected}, found {found}")]
    TypeMismatch {
        function: EcoString,
        expected: EcoString,
        found: EcoString,
    },

    #[error("'{function}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        function: EcoString,
        expected: Arity,
        found: usize,
    },

    #[error("Value of type {found} is not callable")]
    NotCallable { found: EcoString },

    #[error("Index {index} out of bounds (length: {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("Evaluation stack overflow at depth {depth} (limit {max_depth})")]
    StackOverflow { depth: usize, max_depth: usize },

    #[error("Evaluation exceeded the limit of {max_steps} steps")]
    StepLimitExceeded { max_steps: u64 },

    #[error("Evaluation timed out after {elapsed:?} (limit {timeout:?})")]
    Timeout { elapsed: Duration, timeout: Duration },

    #[error("{message}")]
    Custom { message: EcoString },
}

impl RuntimeFault {
    /// A free-form fault raised by a host function.
    pub fn custom(message: impl Into<EcoString>) -> Self {
        RuntimeFault::Custom {
            message: message.into(),
        }
    }

    pub fn type_mismatch(
        function: impl Into<EcoString>,
        expected: impl Into<EcoString>,
        found: impl Into<EcoString>,
    ) -> Self {
        RuntimeFault::TypeMismatch {
            function: function.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn overflow(function: impl Into<EcoString>) -> Self {
        RuntimeFault::IntegerOverflow {
            function: function.into(),
        }
    }

    /// True for faults caused by a resource limit rather than by the script's logic.
    pub fn is_resource_exceeded(&self) -> bool {
        matches!(
            self,
            RuntimeFault::StackOverflow { .. }
                | RuntimeFault::StepLimitExceeded { .. }
                | RuntimeFault::Timeout { .. }
        )
    }

    fn function(&self) -> Option<&EcoString> {
        match self {
            RuntimeFault::IntegerOverflow { function }
            | RuntimeFault::TypeMismatch { function, .. }
            | RuntimeFault::ArityMismatch { function, .. } => Some(function),
            _ => None,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            RuntimeFault::DivisionByZero => "R101",
            RuntimeFault::IntegerOverflow { .. } => "R102",
            RuntimeFault::TypeMismatch { .. } => "R103",
            RuntimeFault::ArityMismatch { .. } => "R104",
            RuntimeFault::NotCallable { .. } => "R105",
            RuntimeFault::IndexOutOfBounds { .. } => "R106",
            RuntimeFault::StackOverflow { .. } => "R201",
            RuntimeFault::StepLimitExceeded { .. } => "R202",
            RuntimeFault::Timeout { .. } => "R203",
            RuntimeFault::Custom { .. } => "R999",
        }
    }
}
