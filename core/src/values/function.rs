//! Callable values: native (host) functions and closures.
//!
//! Both kinds are reference counted and immutable, so a function value can be
//! returned from one evaluation and passed into another on a different thread.

use std::fmt;
use std::sync::Arc;

use ecow::EcoString;

use super::Value;
use crate::analyzer::Lambda;
use crate::evaluator::RuntimeFault;

/// Signature of native functions.
///
/// Arguments are already evaluated and their count already checked against
/// the function's [`Arity`]. Implementations must be free of shared mutable
/// state: the same function may run on many threads at once.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, RuntimeFault> + Send + Sync;

/// Number of arguments accepted by a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Between(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Between(min, max) => (min..=max).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Between(min, max) => write!(f, "between {} and {}", min, max),
        }
    }
}

/// A host function registered in an engine environment.
pub struct NativeFunction {
    name: EcoString,
    arity: Arity,
    doc: EcoString,
    func: Box<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(
        name: impl Into<EcoString>,
        arity: Arity,
        doc: impl Into<EcoString>,
        func: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeFault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            doc: doc.into(),
            func: Box::new(func),
        }
    }

    pub fn name(&self) -> &EcoString {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Invoke the function.
    ///
    /// Returns [`RuntimeFault::ArityMismatch`] without running the body when
    /// the argument count does not fit the function's [`Arity`].
    pub fn call(&self, args: &[Value]) -> Result<Value, RuntimeFault> {
        if !self.arity.accepts(args.len()) {
            return Err(RuntimeFault::ArityMismatch {
                function: self.name.clone(),
                expected: self.arity,
                found: args.len(),
            });
        }
        self.call_unchecked(args)
    }

    /// Invoke the function on arguments whose count was already checked,
    /// at compile time for direct calls or by the evaluator for dynamic ones.
    pub(crate) fn call_unchecked(&self, args: &[Value]) -> Result<Value, RuntimeFault> {
        debug_assert!(self.arity.accepts(args.len()));
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Native functions have identity semantics: two registrations of the same
/// Rust closure are still different functions.
impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self, other)
    }
}

/// A `fn` value: the compiled lambda plus the values it captured when it was
/// created, sorted by name.
#[derive(Debug)]
pub struct Closure {
    pub(crate) lambda: Arc<Lambda>,
    pub(crate) captured: Vec<(EcoString, Value)>,
}

impl Closure {
    pub(crate) fn new(lambda: Arc<Lambda>, mut captured: Vec<(EcoString, Value)>) -> Self {
        captured.sort_by(|(a, _), (b, _)| a.cmp(b));
        Self { lambda, captured }
    }

    pub fn arity(&self) -> Arity {
        Arity::Exact(self.lambda.params.len())
    }

    pub fn params(&self) -> &[EcoString] {
        &self.lambda.params
    }
}

#[derive(Debug, Clone)]
pub enum Function {
    Native(Arc<NativeFunction>),
    Closure(Arc<Closure>),
}

impl Function {
    pub fn name(&self) -> Option<&EcoString> {
        match self {
            Function::Native(native) => Some(native.name()),
            Function::Closure(_) => None,
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Function::Native(native) => native.arity(),
            Function::Closure(closure) => closure.arity(),
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Function::Native(a), Function::Native(b)) => Arc::ptr_eq(a, b),
            (Function::Closure(a), Function::Closure(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native(native) => write!(f, "#<fn {}>", native.name()),
            Function::Closure(closure) => write!(f, "#<fn/{}>", closure.params().len()),
        }
    }
}
