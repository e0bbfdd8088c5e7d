//! Global environment: the constants and functions every script compiled by
//! an engine can see.

use std::sync::Arc;

use ecow::EcoString;
use hashbrown::HashMap;
use lazy_static::lazy_static;
use pest::Parser;

use super::EnvironmentError;
use crate::analyzer::is_special_form;
use crate::evaluator::RuntimeFault;
use crate::parser::{ExpressionParser, Rule};
use crate::section::Section;
use crate::stdlib;
use crate::values::{Arity, NativeFunction, Value};

/// Category used for globals registered before any call to
/// [`EnvironmentBuilder::category`].
pub const DEFAULT_CATEGORY: &str = "Globals";

lazy_static! {
    static ref STANDARD: Arc<Environment> = {
        let mut builder = EnvironmentBuilder::new();
        match stdlib::register_stdlib(&mut builder) {
            Ok(()) => Arc::new(builder.build()),
            Err(err) => panic!("standard library registration is inconsistent: {err}"),
        }
    };
}

#[derive(Debug, Clone)]
struct Global {
    value: Value,
    category: EcoString,
    doc: EcoString,
}

/// Immutable set of named globals, shared by an engine and everything it
/// compiles.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    globals: HashMap<EcoString, Global>,
    /// Registration order, for documentation.
    order: Vec<EcoString>,
}

/// One documented global.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDoc {
    pub name: EcoString,
    /// `None` for constants.
    pub arity: Option<Arity>,
    pub doc: EcoString,
}

impl Environment {
    /// The standard library, built on first use and shared afterwards.
    pub fn standard() -> Arc<Environment> {
        Arc::clone(&STANDARD)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.globals.get(name).map(|global| &global.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Global names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(EcoString::as_str)
    }

    /// Reference tree of every global: one child section per category, in
    /// the order categories were first used, items in registration order.
    pub fn documentation(&self) -> Section<FunctionDoc> {
        let mut categories: Vec<Section<FunctionDoc>> = Vec::new();
        for name in &self.order {
            let global = &self.globals[name];
            let item = FunctionDoc {
                name: name.clone(),
                arity: match &global.value {
                    Value::Function(function) => Some(function.arity()),
                    _ => None,
                },
                doc: global.doc.clone(),
            };
            match categories
                .iter_mut()
                .find(|section| section.title() == global.category.as_str())
            {
                Some(section) => section.add_item(item),
                None => {
                    let mut section = Section::new(global.category.as_str());
                    section.add_item(item);
                    categories.push(section);
                }
            }
        }

        let mut root = Section::new("Kiln reference");
        for section in categories {
            root.add_section(section);
        }
        root
    }
}

/// Builder for constructing the global environment.
///
/// # Example
///
/// ```
/// use kiln_core::api::{Engine, EngineOptions};
/// use kiln_core::values::{Arity, Value};
///
/// let engine = Engine::new(EngineOptions::default(), |env| {
///     env.constant("answer", Value::Int(42), "The answer")?;
///     env.function("twice", Arity::Exact(1), "Doubles an integer", |args| {
///         Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
///     })?;
///     Ok(())
/// })
/// .unwrap();
///
/// assert!(engine.environment().contains("twice"));
/// ```
#[derive(Debug, Default)]
pub struct EnvironmentBuilder {
    environment: Environment,
    category: Option<EcoString>,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing environment, e.g. [`Environment::standard`].
    /// Hosts reach this through [`crate::api::Engine::extending`].
    pub fn extending(base: &Environment) -> Self {
        Self {
            environment: base.clone(),
            category: None,
        }
    }

    /// Category for the globals registered next.
    pub fn category(&mut self, name: impl Into<EcoString>) -> &mut Self {
        self.category = Some(name.into());
        self
    }

    /// Register a global value.
    pub fn constant(
        &mut self,
        name: &str,
        value: impl Into<Value>,
        doc: &str,
    ) -> Result<&mut Self, EnvironmentError> {
        self.insert(name, value.into(), doc)?;
        Ok(self)
    }

    /// Register a host function.
    pub fn function<F>(
        &mut self,
        name: &str,
        arity: Arity,
        doc: &str,
        func: F,
    ) -> Result<&mut Self, EnvironmentError>
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeFault> + Send + Sync + 'static,
    {
        let function = NativeFunction::new(name, arity, doc, func);
        self.insert(name, Value::native(function), doc)?;
        Ok(self)
    }

    fn insert(&mut self, name: &str, value: Value, doc: &str) -> Result<(), EnvironmentError> {
        validate_name(name)?;
        if self.environment.contains(name) {
            return Err(EnvironmentError::DuplicateGlobal { name: name.into() });
        }

        let name = EcoString::from(name);
        let category = self
            .category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.into());
        self.environment.globals.insert(
            name.clone(),
            Global {
                value,
                category,
                doc: doc.into(),
            },
        );
        self.environment.order.push(name);
        Ok(())
    }

    /// Number of globals registered so far, including inherited ones.
    pub fn len(&self) -> usize {
        self.environment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environment.is_empty()
    }

    pub(crate) fn build(self) -> Environment {
        self.environment
    }
}

/// A global must be spelled like a symbol, or scripts could never refer to it.
fn validate_name(name: &str) -> Result<(), EnvironmentError> {
    let invalid = |reason| EnvironmentError::InvalidName {
        name: name.into(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if is_special_form(name) {
        return Err(invalid("name is a special form"));
    }
    match ExpressionParser::parse(Rule::symbol, name) {
        Ok(pairs) if pairs.as_str() == name && !matches!(name, "nil" | "true" | "false") => Ok(()),
        _ => Err(invalid("name is not a symbol")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_register_and_lookup() {
        let mut builder = EnvironmentBuilder::new();
        builder.constant("answer", 42, "The answer").unwrap();
        builder
            .function("id", Arity::Exact(1), "Identity", |args| Ok(args[0].clone()))
            .unwrap();
        let env = builder.build();

        assert_eq!(env.len(), 2);
        assert_eq!(env.get("answer"), Some(&Value::Int(42)));
        assert!(matches!(env.get("id"), Some(Value::Function(_))));
        assert_eq!(env.get("missing"), None);
        assert_eq!(env.names().collect::<Vec<_>>(), vec!["answer", "id"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut builder = EnvironmentBuilder::new();
        builder.constant("x", 1, "").unwrap();
        let err = builder.constant("x", 2, "").unwrap_err();
        assert_eq!(err, EnvironmentError::DuplicateGlobal { name: "x".into() });
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut builder = EnvironmentBuilder::new();
        for name in ["", "if", "let", "1abc", "two words", "(x)", "nil", "true"] {
            assert!(
                matches!(
                    builder.constant(name, 1, ""),
                    Err(EnvironmentError::InvalidName { .. })
                ),
                "{name:?} should be rejected"
            );
        }
        for name in ["x", "kebab-case", "empty?", "->str", "a.b"] {
            assert!(builder.constant(name, 1, "").is_ok(), "{name:?} should be accepted");
        }
    }

    #[test]
    fn test_documentation_groups_by_category() {
        let mut builder = EnvironmentBuilder::new();
        builder.constant("loose", 0, "No category").unwrap();
        builder.category("Math");
        builder
            .function("inc", Arity::Exact(1), "Adds one", |args| Ok(args[0].clone()))
            .unwrap();
        builder.constant("PI", 3.5, "Pi").unwrap();
        let env = builder.build();

        let docs = env.documentation();
        let titles: Vec<_> = docs.sections().iter().map(Section::title).collect();
        assert_eq!(titles, vec![DEFAULT_CATEGORY, "Math"]);

        let math = docs.section("Math").unwrap();
        assert_eq!(
            math.items(),
            &[
                FunctionDoc {
                    name: "inc".into(),
                    arity: Some(Arity::Exact(1)),
                    doc: "Adds one".into(),
                },
                FunctionDoc {
                    name: "PI".into(),
                    arity: None,
                    doc: "Pi".into(),
                },
            ]
        );
    }

    #[test]
    fn test_standard_is_shared() {
        let a = Environment::standard();
        let b = Environment::standard();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.contains("+"));
        assert!(a.contains("PI"));
    }

    #[test]
    fn test_extending_keeps_base() {
        let mut builder = EnvironmentBuilder::extending(&Environment::standard());
        builder.constant("extra", 1, "").unwrap();
        assert!(matches!(
            builder.constant("+", 1, ""),
            Err(EnvironmentError::DuplicateGlobal { .. })
        ));
        let env = builder.build();
        assert!(env.contains("extra"));
        assert!(env.contains("count"));
    }
}
