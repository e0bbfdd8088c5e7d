//! Public error types for the Kiln API.
//!
//! Internal errors (parse, analysis) are converted to these public types at
//! the API boundary. Compile-time and evaluation-time failures are disjoint:
//! a [`CompileError`] only ever comes out of `compile`, an
//! [`EvaluationError`] only ever comes out of `evaluate`.

use core::fmt;

use ecow::EcoString;
use thiserror::Error;

use super::binding::InvalidBindingError;
use crate::analyzer::AnalysisError;
pub use crate::evaluator::{EvaluationError, RuntimeFault};
use crate::parser::{ParseError, Span};

/// Umbrella error so hosts can use `?` across compile, bind and evaluate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Binding(#[from] InvalidBindingError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),
}

impl Error {
    /// Diagnostics describing the error, for rendering.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Error::Compile(err) => err.diagnostics().to_vec(),
            Error::Evaluation(err) => vec![err.to_diagnostic()],
            Error::Binding(_) | Error::Environment(_) => Vec::new(),
        }
    }
}

/// Failure of `compile`. Never deferred to evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("script name must not be empty")]
    EmptyName,

    #[error("compilation of `{name}` failed with {} error(s)", .diagnostics.len())]
    Invalid {
        name: EcoString,
        /// The source that failed, kept for rendering.
        source_text: String,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompileError {
    pub(crate) fn from_parse(name: &EcoString, error: ParseError) -> Self {
        CompileError::Invalid {
            name: name.clone(),
            diagnostics: vec![error.to_diagnostic()],
            source_text: error.source,
        }
    }

    pub(crate) fn from_analysis(
        name: &EcoString,
        source: &str,
        errors: Vec<AnalysisError>,
    ) -> Self {
        CompileError::Invalid {
            name: name.clone(),
            source_text: source.to_string(),
            diagnostics: errors.iter().map(AnalysisError::to_diagnostic).collect(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::EmptyName => &[],
            CompileError::Invalid { diagnostics, .. } => diagnostics,
        }
    }

    /// Source text that failed to compile, if any.
    pub fn source_text(&self) -> Option<&str> {
        match self {
            CompileError::EmptyName => None,
            CompileError::Invalid { source_text, .. } => Some(source_text),
        }
    }

    /// Diagnostic codes in order, e.g. `["P001"]`. Handy for tests.
    pub fn codes(&self) -> Vec<&str> {
        self.diagnostics()
            .iter()
            .filter_map(|d| d.code.as_deref())
            .collect()
    }
}

/// Failure while registering globals in an [`super::EnvironmentBuilder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("global '{name}' is already registered")]
    DuplicateGlobal { name: EcoString },

    #[error("'{name}' is not a valid global name: {reason}")]
    InvalidName { name: EcoString, reason: &'static str },
}

/// A diagnostic message (error, warning, or info) with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level (error, warning, info).
    pub severity: Severity,

    /// Primary diagnostic message.
    pub message: String,

    /// Source location of the primary issue.
    pub span: Span,

    /// Related locations that provide additional context.
    pub related: Vec<RelatedInfo>,

    /// Help texts suggesting how to fix the issue.
    pub help: Vec<String>,

    /// Optional error code (e.g., "P001") for documentation lookup.
    pub code: Option<String>,
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - compilation or evaluation cannot succeed.
    Error,
    /// Warning - suspicious code that might be wrong.
    Warning,
    /// Info - informational message.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Related information for a diagnostic (e.g., "in call to function 'nth'").
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedInfo {
    /// Source location of the related information.
    pub span: Span,

    /// Message explaining the relevance.
    pub message: String,
}
