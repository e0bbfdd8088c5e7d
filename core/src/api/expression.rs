//! Compiled Kiln scripts.

use std::sync::Arc;

use ecow::EcoString;

use crate::analyzer::{FreeVariable, Node};

/// A compiled script ready for evaluation.
///
/// The artifact is immutable: no method mutates it, and it holds no interior
/// mutability. Cloning is a reference-count bump, and one artifact may be
/// evaluated from any number of threads at once without synchronization.
///
/// Two artifacts compiled from the same source by the same engine compare
/// equal (`==`) even though they are owned independently. The source text
/// itself is not retained; only the script name is, for error messages.
///
/// # Example
///
/// ```
/// use kiln_core::api::{Binding, Engine};
/// use kiln_core::values::Value;
///
/// let engine = Engine::default();
/// let script = engine.compile("example", "(+ 1 x)").unwrap();
/// assert_eq!(script.name(), "example");
/// assert_eq!(script.free_variables().collect::<Vec<_>>(), vec!["x"]);
///
/// let result = kiln_core::evaluator::evaluate(
///     &script,
///     Binding::from_pairs([("x", 5)]).unwrap(),
///     &Default::default(),
/// );
/// assert_eq!(result, Ok(Value::Int(6)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledScript {
    inner: Arc<Inner>,
}

#[derive(Debug, PartialEq)]
struct Inner {
    name: EcoString,
    body: Node,
    free_variables: Vec<FreeVariable>,
}

static_assertions::assert_impl_all!(CompiledScript: Send, Sync);

impl CompiledScript {
    /// This is called internally by `Engine::compile()`.
    pub(crate) fn new(name: EcoString, body: Node, free_variables: Vec<FreeVariable>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                body,
                free_variables,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Names the script reads from its binding, sorted and deduplicated.
    pub fn free_variables(&self) -> impl Iterator<Item = &str> {
        self.inner.free_variables.iter().map(|v| v.name.as_str())
    }

    pub(crate) fn name_ref(&self) -> &EcoString {
        &self.inner.name
    }

    pub(crate) fn free_variable_spans(&self) -> &[FreeVariable] {
        &self.inner.free_variables
    }

    pub(crate) fn body(&self) -> &Node {
        &self.inner.body
    }

    /// True if both handles point at the same artifact (not just equal ones).
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
