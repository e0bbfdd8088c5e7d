//! Configuration options for the Kiln engine.

use std::time::Duration;

use crate::parser::DEFAULT_MAX_DEPTH;

/// Configuration options for compilation.
///
/// # Example
///
/// ```
/// use kiln_core::api::CompilationOptions;
///
/// let options = CompilationOptions { max_nesting_depth: 64 };
/// assert_eq!(CompilationOptions::default().max_nesting_depth, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptions {
    /// Maximum nesting of `(` and `[`, checked before the grammar runs.
    ///
    /// Default: 256
    pub max_nesting_depth: usize,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Configuration options for one evaluation.
///
/// These options control resource limits during evaluation. They are read
/// once per call and never shared between calls.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use kiln_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     max_depth: 500,
///     max_steps: Some(10_000),
///     timeout: Some(Duration::from_millis(50)),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Maximum evaluation depth (for recursion protection).
    ///
    /// Native stack use is capped separately at 1 MiB per call, so a large
    /// value here cannot crash the host thread; the lower of the two wins.
    ///
    /// Default: 1000
    pub max_depth: usize,

    /// Maximum number of evaluation steps (if Some).
    ///
    /// Set to `None` for unlimited work (be careful with untrusted code!).
    ///
    /// Default: None
    pub max_steps: Option<u64>,

    /// Wall-clock budget for one call, checked cooperatively.
    ///
    /// Default: None
    pub timeout: Option<Duration>,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_depth: 1000,
            max_steps: None,
            timeout: None,
        }
    }
}

/// Configuration options for the Kiln engine.
///
/// These options set the defaults for compilation and execution,
/// which can be overridden on a per-call basis.
///
/// # Example
///
/// ```
/// use kiln_core::api::{CompilationOptions, EngineOptions, ExecutionOptions};
///
/// let options = EngineOptions {
///     default_compilation_options: CompilationOptions::default(),
///     default_execution_options: ExecutionOptions {
///         max_steps: Some(10_000),
///         ..Default::default()
///     },
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Default options for compilation.
    ///
    /// These can be overridden when calling `Engine::compile_with()`.
    pub default_compilation_options: CompilationOptions,

    /// Default options for execution.
    ///
    /// These can be overridden when calling `Program::evaluate_with()`.
    pub default_execution_options: ExecutionOptions,
}
