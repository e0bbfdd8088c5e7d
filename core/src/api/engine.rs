//! The Kiln compilation engine.

use std::sync::Arc;

use ecow::EcoString;
use tracing::debug;

use super::{
    CompilationOptions, CompileError, CompiledScript, EngineOptions, Environment,
    EnvironmentBuilder, EnvironmentError,
};
use crate::{analyzer, parser};

/// The Kiln compilation engine.
///
/// The engine owns:
/// - the global environment (constants and functions)
/// - the default compilation and execution options
///
/// Compiling is a pure function of the environment and the source text, so
/// one engine can compile from many threads at once.
///
/// # Example
///
/// ```
/// use kiln_core::api::{Engine, EngineOptions};
/// use kiln_core::values::{Arity, Value};
///
/// let engine = Engine::new(EngineOptions::default(), |env| {
///     env.constant("limit", Value::Int(10), "Upper bound")?;
///     env.function("add", Arity::Exact(2), "Adds two integers", |args| {
///         match (args[0].as_int(), args[1].as_int()) {
///             (Some(a), Some(b)) => Ok(Value::Int(a.wrapping_add(b))),
///             _ => Err(kiln_core::evaluator::RuntimeFault::custom("add expects integers")),
///         }
///     })?;
///     Ok(())
/// })
/// .unwrap();
///
/// let script = engine.compile("sum", "(add limit 32)").unwrap();
/// assert_eq!(script.free_variables().count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    environment: Arc<Environment>,
    options: EngineOptions,
}

static_assertions::assert_impl_all!(Engine: Send, Sync);

impl Engine {
    /// Create an engine with a custom environment.
    ///
    /// The closure receives an empty builder. Call
    /// [`crate::stdlib::register_stdlib`] inside it to include the standard
    /// library.
    pub fn new(
        options: EngineOptions,
        init: impl FnOnce(&mut EnvironmentBuilder) -> Result<(), EnvironmentError>,
    ) -> Result<Self, EnvironmentError> {
        Self::from_builder(EnvironmentBuilder::new(), options, init)
    }

    /// Create an engine whose environment starts as a copy of `base`.
    ///
    /// Globals registered by `init` come after those of `base`; reusing one
    /// of its names is an [`EnvironmentError::DuplicateGlobal`].
    ///
    /// ```
    /// use kiln_core::api::{Engine, EngineOptions, Environment};
    ///
    /// let engine = Engine::extending(&Environment::standard(), EngineOptions::default(), |env| {
    ///     env.category("Site");
    ///     env.constant("max-items", 50, "Items per page")?;
    ///     Ok(())
    /// })
    /// .unwrap();
    ///
    /// assert!(engine.compile("page", "(min max-items (count items))").is_ok());
    /// ```
    pub fn extending(
        base: &Environment,
        options: EngineOptions,
        init: impl FnOnce(&mut EnvironmentBuilder) -> Result<(), EnvironmentError>,
    ) -> Result<Self, EnvironmentError> {
        Self::from_builder(EnvironmentBuilder::extending(base), options, init)
    }

    fn from_builder(
        mut builder: EnvironmentBuilder,
        options: EngineOptions,
        init: impl FnOnce(&mut EnvironmentBuilder) -> Result<(), EnvironmentError>,
    ) -> Result<Self, EnvironmentError> {
        init(&mut builder)?;
        debug!(globals = builder.len(), "Built environment");
        Ok(Self {
            environment: Arc::new(builder.build()),
            options,
        })
    }

    /// An engine over the shared standard library environment.
    pub fn with_stdlib(options: EngineOptions) -> Self {
        Self {
            environment: Environment::standard(),
            options,
        }
    }

    /// Access the global environment.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Access the engine options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Compile a script using the engine's default compilation options.
    pub fn compile(&self, name: &str, source: &str) -> Result<CompiledScript, CompileError> {
        self.compile_with(&self.options.default_compilation_options, name, source)
    }

    /// Compile a script.
    ///
    /// # Errors
    ///
    /// - [`CompileError::EmptyName`] if `name` is empty.
    /// - [`CompileError::Invalid`] with every diagnostic found, if the source
    ///   does not parse or does not resolve.
    pub fn compile_with(
        &self,
        options: &CompilationOptions,
        name: &str,
        source: &str,
    ) -> Result<CompiledScript, CompileError> {
        if name.is_empty() {
            return Err(CompileError::EmptyName);
        }
        let name = EcoString::from(name);

        let parsed = parser::parse_with_max_depth(source, options.max_nesting_depth)
            .map_err(|err| {
                debug!(script = %name, error = %err, "Parse failed");
                CompileError::from_parse(&name, err)
            })?;

        let analysis = analyzer::analyze(&self.environment, &parsed).map_err(|errors| {
            debug!(script = %name, errors = errors.len(), "Analysis failed");
            CompileError::from_analysis(&name, source, errors)
        })?;

        debug!(
            script = %name,
            free_variables = analysis.free_variables.len(),
            "Compiled script"
        );
        Ok(CompiledScript::new(
            name,
            analysis.body,
            analysis.free_variables,
        ))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_stdlib(EngineOptions::default())
    }
}
