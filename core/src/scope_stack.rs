//! Generic scope stack for local bindings.
//!
//! Used by both the analyzer (binds `()` markers to resolve names) and the
//! evaluator (binds values). Supports two kinds of scopes through a unified
//! `Scope` trait:
//! - **Complete scopes**: Immutable, pre-populated (function parameters,
//!   closure captures)
//! - **Incomplete scopes**: Filled incrementally (`let`)
//!
//! The incomplete scope design enables sequential binding semantics where
//! later bindings can reference earlier ones:
//! ```text
//! (let [a 1 b (+ a 1)] b)  ; `b` can see `a`
//! ```
//!
//! Scope storage lives in a `Bump` arena owned by the caller: one per compile
//! in the analyzer, one per function activation in the evaluator. The bump
//! collections used here still run destructors, so values holding
//! reference-counted data are released when their scope is popped.

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;
use thiserror::Error;

/// Trait for scopes that can be pushed onto the ScopeStack.
///
/// The lifetime parameter `'a` is for the arena where scope data is allocated.
pub trait Scope<'a, T> {
    /// Look up a name in this scope.
    ///
    /// Returns Some(&value) if the name is bound, None otherwise.
    fn lookup(&self, name: &str) -> Option<&T>;

    /// Bind a value to a name in this scope.
    ///
    /// Complete scopes return `BindError::ScopeIsImmutable`.
    /// Incomplete scopes fill in the value if the name was pre-declared.
    fn bind(&mut self, name: &str, value: T) -> Result<(), BindError>;
}

/// A complete, immutable scope.
///
/// Bindings are pre-populated and sorted for binary search.
pub struct CompleteScope<'a, T>(BumpVec<'a, (&'a str, T)>);

impl<'a, T> CompleteScope<'a, T> {
    /// Create a new complete scope from sorted bindings.
    ///
    /// The bindings must be sorted by name for binary search to work.
    pub fn from_sorted(bindings: BumpVec<'a, (&'a str, T)>) -> CompleteScope<'a, T> {
        debug_assert!(is_sorted(&bindings), "Bindings must be sorted by name");
        CompleteScope(bindings)
    }

    /// Create a complete scope from bindings in any order.
    ///
    /// Returns an error if there are duplicate names.
    pub fn from_unsorted(
        arena: &'a Bump,
        bindings: impl IntoIterator<Item = (&'a str, T)>,
    ) -> Result<CompleteScope<'a, T>, DuplicateError> {
        let mut sorted = BumpVec::from_iter_in(bindings, arena);
        sorted.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
        if let Some(window) = sorted.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(DuplicateError(window[0].0.to_string()));
        }
        Ok(CompleteScope(sorted))
    }
}

impl<'a, T> Scope<'a, T> for CompleteScope<'a, T> {
    fn lookup(&self, name: &str) -> Option<&T> {
        self.0
            .binary_search_by_key(&name, |(n, _)| *n)
            .ok()
            .map(|idx| &self.0[idx].1)
    }

    fn bind(&mut self, _name: &str, _value: T) -> Result<(), BindError> {
        Err(BindError::ScopeIsImmutable)
    }
}

/// An incomplete, mutable scope being built.
///
/// Names are pre-declared and sorted. Values start as None and are filled incrementally.
pub struct IncompleteScope<'a, T>(BumpVec<'a, (&'a str, Option<T>)>);

impl<'a, T> IncompleteScope<'a, T> {
    /// Create a new incomplete scope with pre-declared names.
    ///
    /// Returns an error if there are duplicate names.
    pub fn new(arena: &'a Bump, names: &[&'a str]) -> Result<Self, DuplicateError> {
        let mut slots = BumpVec::with_capacity_in(names.len(), arena);
        slots.extend(names.iter().map(|name| (*name, None)));
        slots.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

        if let Some(window) = slots.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(DuplicateError(window[0].0.to_string()));
        }
        Ok(Self(slots))
    }
}

impl<'a, T> Scope<'a, T> for IncompleteScope<'a, T> {
    fn lookup(&self, name: &str) -> Option<&T> {
        self.0
            .binary_search_by_key(&name, |(n, _)| *n)
            .ok()
            .and_then(|idx| self.0[idx].1.as_ref())
    }

    fn bind(&mut self, name: &str, value: T) -> Result<(), BindError> {
        match self.0.binary_search_by_key(&name, |(n, _)| *n) {
            Ok(idx) => {
                if self.0[idx].1.is_some() {
                    Err(BindError::AlreadyBound(name.to_string()))
                } else {
                    self.0[idx].1 = Some(value);
                    Ok(())
                }
            }
            Err(_) => Err(BindError::NameNotDeclared(name.to_string())),
        }
    }
}

/// A stack of scopes for name lookup.
///
/// Maintains a single stack of boxed trait objects, searched from innermost to outermost.
pub struct ScopeStack<'a, T> {
    scopes: Vec<Box<dyn Scope<'a, T> + 'a>>,
}

impl<'a, T> Default for ScopeStack<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> ScopeStack<'a, T> {
    /// Create a new empty scope stack.
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Number of scopes currently on the stack.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Push a scope onto the stack.
    pub fn push<S: Scope<'a, T> + 'a>(&mut self, scope: S) {
        self.scopes.push(Box::new(scope));
    }

    /// Pop the topmost scope from the stack.
    ///
    /// Returns an error if the stack is empty.
    pub fn pop(&mut self) -> Result<(), PopError> {
        self.scopes.pop().ok_or(PopError::EmptyStack)?;
        Ok(())
    }

    /// Look up a name, searching scopes from innermost to outermost.
    ///
    /// Returns the first matching value found, or None if not found in any scope.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.lookup_with_index(name).map(|(_, value)| value)
    }

    /// Like `lookup`, but also returns the index (from the bottom of the
    /// stack) of the scope that holds the name.
    pub fn lookup_with_index(&self, name: &str) -> Option<(usize, &T)> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(idx, scope)| scope.lookup(name).map(|value| (idx, value)))
    }

    /// Bind a value in the topmost scope.
    ///
    /// Returns an error if:
    /// - The stack is empty
    /// - The topmost scope is immutable (complete scope)
    /// - The name was not pre-declared (incomplete scope)
    /// - The name is already bound (incomplete scope)
    pub fn bind_in_current(&mut self, name: &str, value: T) -> Result<(), BindError> {
        self.scopes
            .last_mut()
            .ok_or(BindError::NoScope)?
            .bind(name, value)
    }
}

/// Check if a slice is sorted by name (for debug assertions).
fn is_sorted<T>(slice: &[(&str, T)]) -> bool {
    slice.windows(2).all(|w| w[0].0 <= w[1].0)
}

/// Error when trying to bind a value in a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// No scope exists to bind in.
    #[error("No scope to bind in")]
    NoScope,
    /// The scope is immutable (complete scope).
    #[error("Cannot bind in immutable scope")]
    ScopeIsImmutable,
    /// The name has already been bound in the current scope.
    #[error("Name '{0}' already bound in current scope")]
    AlreadyBound(String),
    /// The name was not declared when the scope was created.
    #[error("Name '{0}' not declared in current scope")]
    NameNotDeclared(String),
}

/// Error when trying to pop a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopError {
    /// The stack is empty.
    #[error("Cannot pop from empty scope stack")]
    EmptyStack,
}

/// Error when duplicate names are found in a scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Duplicate name '{0}' in scope")]
pub struct DuplicateError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_scope_lookup() {
        let bump = Bump::new();
        let mut stack = ScopeStack::new();

        let bindings = bumpalo::vec![in &bump; ("a", 1), ("b", 2), ("c", 3)];
        stack.push(CompleteScope::from_sorted(bindings));

        assert_eq!(stack.lookup("a"), Some(&1));
        assert_eq!(stack.lookup("b"), Some(&2));
        assert_eq!(stack.lookup("c"), Some(&3));
        assert_eq!(stack.lookup("d"), None);
    }

    #[test]
    fn test_complete_scope_from_unsorted() {
        let bump = Bump::new();
        let mut stack = ScopeStack::new();

        let scope = CompleteScope::from_unsorted(&bump, [("z", 26), ("a", 1), ("m", 13)]).unwrap();
        stack.push(scope);

        assert_eq!(stack.lookup("a"), Some(&1));
        assert_eq!(stack.lookup("m"), Some(&13));
        assert_eq!(stack.lookup("z"), Some(&26));

        let duplicate = CompleteScope::from_unsorted(&bump, [("x", 1), ("x", 2)]);
        assert!(matches!(duplicate, Err(DuplicateError(name)) if name == "x"));
    }

    #[test]
    fn test_incomplete_scope_sequential_binding() {
        let bump = Bump::new();
        let mut stack = ScopeStack::new();

        // Push incomplete scope with names
        stack.push(IncompleteScope::new(&bump, &["a", "b"]).unwrap());

        // Before binding, lookup returns None
        assert_eq!(stack.lookup("a"), None);
        assert_eq!(stack.lookup("b"), None);

        stack.bind_in_current("a", 1).unwrap();
        assert_eq!(stack.lookup("a"), Some(&1));
        assert_eq!(stack.lookup("b"), None);

        stack.bind_in_current("b", 2).unwrap();
        assert_eq!(stack.lookup("a"), Some(&1));
        assert_eq!(stack.lookup("b"), Some(&2));
    }

    #[test]
    fn test_shadowing_and_index() {
        let bump = Bump::new();
        let mut stack = ScopeStack::new();

        stack.push(CompleteScope::from_sorted(bumpalo::vec![in &bump; ("a", 1), ("b", 2)]));

        // Push incomplete scope that shadows 'a'
        stack.push(IncompleteScope::new(&bump, &["a"]).unwrap());
        stack.bind_in_current("a", 10).unwrap();

        assert_eq!(stack.lookup_with_index("a"), Some((1, &10)));
        assert_eq!(stack.lookup_with_index("b"), Some((0, &2)));

        stack.pop().unwrap();

        // Original 'a' is visible again
        assert_eq!(stack.lookup("a"), Some(&1));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_popped_values_are_dropped() {
        use std::sync::Arc;

        let bump = Bump::new();
        let shared = Arc::new(5);
        let mut stack = ScopeStack::new();

        stack.push(IncompleteScope::new(&bump, &["a"]).unwrap());
        stack.bind_in_current("a", shared.clone()).unwrap();
        assert_eq!(Arc::strong_count(&shared), 2);

        stack.pop().unwrap();
        assert_eq!(Arc::strong_count(&shared), 1);
    }

    #[test]
    fn test_duplicate_names_error() {
        let bump = Bump::new();

        let result = IncompleteScope::<i32>::new(&bump, &["a", "b", "a"]);
        assert!(matches!(result, Err(DuplicateError(_))));
    }

    #[test]
    fn test_bind_errors() {
        let bump = Bump::new();
        let mut stack = ScopeStack::new();

        assert_eq!(stack.bind_in_current("a", 1), Err(BindError::NoScope));
        assert_eq!(stack.pop(), Err(PopError::EmptyStack));

        stack.push(CompleteScope::from_sorted(bumpalo::vec![in &bump; ("a", 1)]));
        assert_eq!(stack.bind_in_current("a", 10), Err(BindError::ScopeIsImmutable));

        stack.push(IncompleteScope::new(&bump, &["a"]).unwrap());
        stack.bind_in_current("a", 1).unwrap();
        assert_eq!(
            stack.bind_in_current("a", 2),
            Err(BindError::AlreadyBound("a".to_string()))
        );
        assert_eq!(
            stack.bind_in_current("b", 1),
            Err(BindError::NameNotDeclared("b".to_string()))
        );
    }
}
