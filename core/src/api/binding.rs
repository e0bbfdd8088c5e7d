//! Per-call input bindings.
//!
//! A [`Binding`] maps parameter names to values for exactly one evaluation.
//! `evaluate` takes it by value and it is dropped when the call returns, so a
//! binding can never be observed by a second call. It is deliberately not
//! `Clone`: build a fresh one for every call.
//!
//! Construction is all-or-nothing. Odd token counts, non-string names and
//! duplicate names are rejected; there is no "last write wins".

use ecow::EcoString;
use thiserror::Error;

use crate::values::Value;

/// Immutable name → value mapping for one evaluation call.
#[derive(Debug, Default, PartialEq)]
pub struct Binding {
    /// Sorted by name, names unique.
    entries: Vec<(EcoString, Value)>,
}

/// Why a [`Binding`] could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidBindingError {
    #[error("binding needs an even number of name/value tokens, got {count}")]
    OddTokenCount { count: usize },

    #[error("binding token {position} must be a non-empty string name, found {found}")]
    InvalidName { position: usize, found: EcoString },

    #[error("name '{name}' appears more than once in the binding")]
    DuplicateName { name: EcoString },
}

impl Binding {
    /// A binding with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a binding from a flat sequence alternating names and values:
    /// `["x", 1, "y", 2]`.
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_core::api::Binding;
    /// use kiln_core::values::Value;
    ///
    /// let binding = Binding::of([Value::from("x"), Value::from(5)]).unwrap();
    /// assert_eq!(binding.get("x"), Some(&Value::from(5)));
    ///
    /// assert!(Binding::of([Value::from("x")]).is_err());
    /// ```
    pub fn of<I>(tokens: I) -> Result<Self, InvalidBindingError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let tokens: Vec<Value> = tokens.into_iter().map(Into::into).collect();
        if tokens.len() % 2 != 0 {
            return Err(InvalidBindingError::OddTokenCount {
                count: tokens.len(),
            });
        }

        let mut pairs = Vec::with_capacity(tokens.len() / 2);
        let mut tokens = tokens.into_iter().enumerate();
        while let (Some((position, name)), Some((_, value))) = (tokens.next(), tokens.next()) {
            let name = match name {
                Value::Str(name) if !name.is_empty() => name,
                Value::Str(_) => {
                    return Err(InvalidBindingError::InvalidName {
                        position,
                        found: "an empty string".into(),
                    });
                }
                other => {
                    return Err(InvalidBindingError::InvalidName {
                        position,
                        found: other.type_name().into(),
                    });
                }
            };
            pairs.push((name, value));
        }
        Self::from_entries(pairs)
    }

    /// Build a binding from `(name, value)` pairs.
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_core::api::Binding;
    ///
    /// let binding = Binding::from_pairs([("x", 1), ("y", 2)]).unwrap();
    /// assert_eq!(binding.len(), 2);
    ///
    /// assert!(Binding::from_pairs([("x", 1), ("x", 2)]).is_err());
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, InvalidBindingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<EcoString>,
        V: Into<Value>,
    {
        let mut entries = Vec::new();
        for (position, (name, value)) in pairs.into_iter().enumerate() {
            let name = name.into();
            if name.is_empty() {
                return Err(InvalidBindingError::InvalidName {
                    position: position * 2,
                    found: "an empty string".into(),
                });
            }
            entries.push((name, value.into()));
        }
        Self::from_entries(entries)
    }

    fn from_entries(mut entries: Vec<(EcoString, Value)>) -> Result<Self, InvalidBindingError> {
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        if let Some(window) = entries.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(InvalidBindingError::DuplicateName {
                name: window[0].0.clone(),
            });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_of_alternating_tokens() {
        let binding = Binding::of([
            Value::from("y"),
            Value::from(2),
            Value::from("x"),
            Value::from("one"),
        ])
        .unwrap();

        assert_eq!(binding.len(), 2);
        assert_eq!(binding.get("x"), Some(&Value::from("one")));
        assert_eq!(binding.get("y"), Some(&Value::from(2)));
        assert_eq!(binding.get("z"), None);
        assert_eq!(binding.names().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_of_rejects_odd_count() {
        let err = Binding::of([Value::from("x"), Value::from(1), Value::from("y")]).unwrap_err();
        assert_eq!(err, InvalidBindingError::OddTokenCount { count: 3 });
    }

    #[test]
    fn test_of_rejects_duplicates() {
        let err = Binding::of([
            Value::from("x"),
            Value::from(1),
            Value::from("x"),
            Value::from(2),
        ])
        .unwrap_err();
        assert_eq!(err, InvalidBindingError::DuplicateName { name: "x".into() });
    }

    #[test]
    fn test_of_rejects_non_string_names() {
        let err = Binding::of([Value::from(1), Value::from(2)]).unwrap_err();
        assert_eq!(
            err,
            InvalidBindingError::InvalidName {
                position: 0,
                found: "integer".into()
            }
        );

        let err = Binding::of([Value::from("a"), Value::from(1), Value::from(""), Value::Nil])
            .unwrap_err();
        assert_eq!(
            err,
            InvalidBindingError::InvalidName {
                position: 2,
                found: "an empty string".into()
            }
        );
    }

    #[test]
    fn test_from_pairs() {
        let binding = Binding::from_pairs([("b", 2), ("a", 1)]).unwrap();
        assert_eq!(binding.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(binding.contains("a"));

        let err = Binding::from_pairs([("a", 1), ("b", 2), ("a", 3)]).unwrap_err();
        assert_eq!(err, InvalidBindingError::DuplicateName { name: "a".into() });

        let err = Binding::from_pairs([("", 1)]).unwrap_err();
        assert!(matches!(err, InvalidBindingError::InvalidName { position: 0, .. }));
    }

    #[test]
    fn test_empty() {
        let binding = Binding::empty();
        assert!(binding.is_empty());
        assert_eq!(Binding::of(Vec::<Value>::new()).unwrap(), binding);
    }
}
