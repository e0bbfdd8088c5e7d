//! Name resolution and special-form validation.

use std::sync::Arc;

use bumpalo::Bump;
use ecow::EcoString;
use hashbrown::HashMap;

use super::compiled_expr::{FreeVariable, Lambda, Node, NodeKind};
use super::error::{AnalysisError, AnalysisErrorKind};
use crate::api::Environment;
use crate::diagnostics::context::Context;
use crate::parser::{Form, FormKind, ParsedScript, Span};
use crate::scope_stack::{CompleteScope, IncompleteScope, ScopeStack};
use crate::values::{Function, Value};

/// Names handled by the analyzer itself rather than looked up.
pub const SPECIAL_FORMS: &[&str] = &["and", "do", "fn", "if", "let", "or", "quote"];

pub fn is_special_form(name: &str) -> bool {
    SPECIAL_FORMS.contains(&name)
}

/// Output of a successful analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub body: Node,
    /// Names read from the binding, sorted, with their first occurrence.
    pub free_variables: Vec<FreeVariable>,
}

/// Resolve every name in `script` against `environment`.
///
/// All errors found are returned, not just the first one.
pub fn analyze(
    environment: &Environment,
    script: &ParsedScript,
) -> Result<Analysis, Vec<AnalysisError>> {
    let arena = Bump::new();
    let mut analyzer = Analyzer::new(&arena, environment);

    let mut nodes: Vec<Node> = script
        .forms
        .iter()
        .map(|form| analyzer.analyze_form(form))
        .collect();

    if !analyzer.errors.is_empty() {
        return Err(analyzer.errors);
    }

    let body = if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        Node::new(NodeKind::Do(nodes), script.span.clone())
    };

    let mut free_variables: Vec<FreeVariable> = analyzer
        .free
        .into_iter()
        .map(|(name, span)| FreeVariable { name, span })
        .collect();
    free_variables.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Analysis {
        body,
        free_variables,
    })
}

/// A `fn` form being analyzed.
struct LambdaFrame {
    /// Scope stack height when the lambda's parameters were pushed.
    base: usize,
    captures: Vec<EcoString>,
}

struct Analyzer<'a> {
    arena: &'a Bump,
    environment: &'a Environment,
    scopes: ScopeStack<'a, ()>,
    lambdas: Vec<LambdaFrame>,
    free: HashMap<EcoString, Span>,
    errors: Vec<AnalysisError>,
}

impl<'a> Analyzer<'a> {
    fn new(arena: &'a Bump, environment: &'a Environment) -> Self {
        Self {
            arena,
            environment,
            scopes: ScopeStack::new(),
            lambdas: Vec::new(),
            free: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Record an error and return a placeholder so analysis can continue.
    fn error(&mut self, error: AnalysisError) -> Node {
        let span = error.span.clone();
        self.errors.push(error);
        Node::new(NodeKind::Constant(Value::Nil), span)
    }

    fn analyze_form(&mut self, form: &Form) -> Node {
        let span = form.span.clone();
        match &form.kind {
            FormKind::Nil => Node::new(NodeKind::Constant(Value::Nil), span),
            FormKind::Bool(b) => Node::new(NodeKind::Constant(Value::Bool(*b)), span),
            FormKind::Int(i) => Node::new(NodeKind::Constant(Value::Int(*i)), span),
            FormKind::Float(x) => Node::new(NodeKind::Constant(Value::Float(*x)), span),
            FormKind::Str(s) => Node::new(NodeKind::Constant(Value::Str(s.clone())), span),
            FormKind::Symbol(name) => self.resolve_symbol(name, span),
            FormKind::Vector(items) => {
                let items = self.analyze_all(items);
                Node::new(NodeKind::List(items), span)
            }
            FormKind::List(items) => self.analyze_list(items, span),
        }
    }

    fn analyze_all(&mut self, forms: &[Form]) -> Vec<Node> {
        forms.iter().map(|form| self.analyze_form(form)).collect()
    }

    fn resolve_symbol(&mut self, name: &EcoString, span: Span) -> Node {
        if let Some((index, _)) = self.scopes.lookup_with_index(name) {
            self.capture(name, Some(index));
            return Node::new(NodeKind::Local(name.clone()), span);
        }

        if let Some(value) = self.environment.get(name) {
            return Node::new(NodeKind::Constant(value.clone()), span);
        }

        if is_special_form(name) {
            return self.error(AnalysisError::new(
                AnalysisErrorKind::MalformedSpecialForm {
                    form: name.to_string(),
                    message: "special forms cannot be used as values".to_string(),
                },
                span,
            ));
        }

        self.free.entry(name.clone()).or_insert_with(|| span.clone());

        // Lambda bodies only see their own frames, so a free variable read
        // inside a lambda travels in as a capture.
        if self.lambdas.is_empty() {
            Node::new(NodeKind::Free(name.clone()), span)
        } else {
            self.capture(name, None);
            Node::new(NodeKind::Local(name.clone()), span)
        }
    }

    /// Mark `name` as captured by every enclosing lambda whose parameters
    /// were pushed above the scope that defines it.
    fn capture(&mut self, name: &EcoString, defined_at: Option<usize>) {
        for frame in self.lambdas.iter_mut() {
            let outside = defined_at.is_none_or(|index| index < frame.base);
            if outside && !frame.captures.contains(name) {
                frame.captures.push(name.clone());
            }
        }
    }

    fn analyze_list(&mut self, items: &[Form], span: Span) -> Node {
        let Some((head, args)) = items.split_first() else {
            return Node::new(NodeKind::Constant(Value::list([])), span);
        };

        match &head.kind {
            FormKind::Symbol(name) if is_special_form(name) => {
                self.analyze_special_form(name, args, span)
            }
            FormKind::Symbol(name) => self.analyze_named_call(name, head, args, span),
            FormKind::List(_) => {
                let callee = self.analyze_form(head);
                let args = self.analyze_all(args);
                Node::new(
                    NodeKind::Call {
                        callee: Box::new(callee),
                        args,
                    },
                    span,
                )
            }
            _ => {
                self.analyze_all(args);
                self.error(AnalysisError::new(
                    AnalysisErrorKind::NotCallable {
                        found: format!("{} literal", head.describe()),
                    },
                    head.span.clone(),
                ))
            }
        }
    }

    fn analyze_named_call(
        &mut self,
        name: &EcoString,
        head: &Form,
        args: &[Form],
        span: Span,
    ) -> Node {
        if self.scopes.lookup(name).is_some() {
            let callee = self.resolve_symbol(name, head.span.clone());
            let args = self.analyze_all(args);
            return Node::new(
                NodeKind::Call {
                    callee: Box::new(callee),
                    args,
                },
                span,
            );
        }

        let Some(global) = self.environment.get(name).cloned() else {
            self.analyze_all(args);
            return self.error(AnalysisError::new(
                AnalysisErrorKind::UnknownFunction {
                    name: name.to_string(),
                },
                head.span.clone(),
            ));
        };

        let args = self.analyze_all(args);
        match global {
            Value::Function(Function::Native(function)) => {
                let arity = function.arity();
                if !arity.accepts(args.len()) {
                    return self.error(
                        AnalysisError::new(
                            AnalysisErrorKind::ArityMismatch {
                                name: name.to_string(),
                                expected: arity,
                                found: args.len(),
                            },
                            span.clone(),
                        )
                        .with_context(Context::InFunctionCall {
                            name: Some(name.to_string()),
                            span: head.span.clone(),
                        }),
                    );
                }
                Node::new(NodeKind::CallNative { function, args }, span)
            }
            Value::Function(function) => Node::new(
                NodeKind::Call {
                    callee: Box::new(Node::new(
                        NodeKind::Constant(Value::Function(function)),
                        head.span.clone(),
                    )),
                    args,
                },
                span,
            ),
            other => self.error(
                AnalysisError::new(
                    AnalysisErrorKind::NotCallable {
                        found: format!("global '{}' ({})", name, other.type_name()),
                    },
                    head.span.clone(),
                )
                .with_context(Context::DefinedHere {
                    what: format!("'{}'", name),
                    span: head.span.clone(),
                }),
            ),
        }
    }

    fn analyze_special_form(&mut self, form: &str, args: &[Form], span: Span) -> Node {
        match form {
            "if" => self.analyze_if(args, span),
            "do" => {
                let body = self.analyze_all(args);
                Node::new(NodeKind::Do(body), span)
            }
            "and" => {
                let items = self.analyze_all(args);
                Node::new(NodeKind::And(items), span)
            }
            "or" => {
                let items = self.analyze_all(args);
                Node::new(NodeKind::Or(items), span)
            }
            "quote" => match args {
                [quoted] => Node::new(NodeKind::Constant(quote(quoted)), span),
                _ => self.malformed("quote", "expects exactly one form", span),
            },
            "let" => self.analyze_let(args, span),
            "fn" => self.analyze_fn(args, span),
            _ => self.malformed(form, "unsupported special form", span),
        }
    }

    fn malformed(&mut self, form: &str, message: &str, span: Span) -> Node {
        self.error(
            AnalysisError::new(
                AnalysisErrorKind::MalformedSpecialForm {
                    form: form.to_string(),
                    message: message.to_string(),
                },
                span.clone(),
            )
            .with_context(Context::InSpecialForm {
                form: form.to_string(),
                span,
            }),
        )
    }

    fn analyze_if(&mut self, args: &[Form], span: Span) -> Node {
        let (cond, then_branch, else_branch) = match args {
            [cond, then_branch] => (cond, then_branch, None),
            [cond, then_branch, else_branch] => (cond, then_branch, Some(else_branch)),
            _ => {
                return self.malformed(
                    "if",
                    &format!("expects 2 or 3 forms, got {}", args.len()),
                    span,
                );
            }
        };
        let cond = self.analyze_form(cond);
        let then_branch = self.analyze_form(then_branch);
        let else_branch = else_branch.map(|form| Box::new(self.analyze_form(form)));
        Node::new(
            NodeKind::If {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch,
            },
            span,
        )
    }

    /// Validate a binding vector (`let` pairs or `fn` parameters) and return
    /// the bound names.
    fn binding_names<'f>(
        &mut self,
        form: &str,
        targets: impl Iterator<Item = &'f Form>,
    ) -> Option<Vec<EcoString>> {
        let mut names: Vec<EcoString> = Vec::new();
        let mut ok = true;
        for target in targets {
            match target.as_symbol() {
                Some(name) if is_special_form(name) => {
                    ok = false;
                    self.error(
                        AnalysisError::new(
                            AnalysisErrorKind::InvalidBindingTarget {
                                found: format!("special form '{}'", name),
                            },
                            target.span.clone(),
                        )
                        .with_context(Context::InSpecialForm {
                            form: form.to_string(),
                            span: target.span.clone(),
                        }),
                    );
                }
                Some(name) if names.contains(name) => {
                    ok = false;
                    self.error(
                        AnalysisError::new(
                            AnalysisErrorKind::DuplicateBinding {
                                name: name.to_string(),
                            },
                            target.span.clone(),
                        )
                        .with_context(Context::InSpecialForm {
                            form: form.to_string(),
                            span: target.span.clone(),
                        }),
                    );
                }
                Some(name) => names.push(name.clone()),
                None => {
                    ok = false;
                    self.error(AnalysisError::new(
                        AnalysisErrorKind::InvalidBindingTarget {
                            found: target.describe().to_string(),
                        },
                        target.span.clone(),
                    ));
                }
            }
        }
        ok.then_some(names)
    }

    fn analyze_let(&mut self, args: &[Form], span: Span) -> Node {
        let Some((FormKind::Vector(pairs), body)) = split_vector_head(args) else {
            return self.malformed("let", "expects a binding vector", span);
        };
        if pairs.len() % 2 != 0 {
            return self.malformed("let", "binding vector needs an even number of forms", span);
        }

        let Some(names) = self.binding_names("let", pairs.iter().step_by(2)) else {
            return Node::new(NodeKind::Constant(Value::Nil), span);
        };

        let arena = self.arena;
        let arena_names: Vec<&'a str> = names.iter().map(|name| &*arena.alloc_str(name)).collect();
        let scope = match IncompleteScope::new(arena, &arena_names) {
            Ok(scope) => scope,
            Err(_) => return self.malformed("let", "duplicate binding", span),
        };
        self.scopes.push(scope);

        let mut bindings = Vec::with_capacity(names.len());
        for (name, value) in names.into_iter().zip(pairs.iter().skip(1).step_by(2)) {
            let value = self.analyze_form(value);
            let bound = self.scopes.bind_in_current(&name, ());
            debug_assert!(bound.is_ok(), "let name '{name}' was not declared");
            bindings.push((name, value));
        }
        let body = self.analyze_all(body);
        let popped = self.scopes.pop();
        debug_assert!(popped.is_ok(), "let scope missing from the stack");

        Node::new(NodeKind::Let { bindings, body }, span)
    }

    fn analyze_fn(&mut self, args: &[Form], span: Span) -> Node {
        let Some((FormKind::Vector(params), body)) = split_vector_head(args) else {
            return self.malformed("fn", "expects a parameter vector", span);
        };

        let Some(params) = self.binding_names("fn", params.iter()) else {
            return Node::new(NodeKind::Constant(Value::Nil), span);
        };

        let arena = self.arena;
        let base = self.scopes.len();
        let scope = CompleteScope::from_unsorted(
            arena,
            params.iter().map(|name| (&*arena.alloc_str(name), ())),
        );
        let Ok(scope) = scope else {
            return self.malformed("fn", "duplicate parameter", span);
        };
        self.scopes.push(scope);
        self.lambdas.push(LambdaFrame {
            base,
            captures: Vec::new(),
        });

        let body = self.analyze_all(body);

        let frame = self.lambdas.pop();
        let popped = self.scopes.pop();
        debug_assert!(popped.is_ok(), "fn scope missing from the stack");

        let mut captures = frame.map(|frame| frame.captures).unwrap_or_default();
        captures.sort();

        Node::new(
            NodeKind::Lambda(Arc::new(Lambda {
                params,
                captures,
                body,
                span: span.clone(),
            })),
            span,
        )
    }
}

/// Turn a quoted form into data: symbols become strings, lists and vectors
/// become lists.
fn quote(form: &Form) -> Value {
    match &form.kind {
        FormKind::Nil => Value::Nil,
        FormKind::Bool(b) => Value::Bool(*b),
        FormKind::Int(i) => Value::Int(*i),
        FormKind::Float(x) => Value::Float(*x),
        FormKind::Str(s) | FormKind::Symbol(s) => Value::Str(s.clone()),
        FormKind::List(items) | FormKind::Vector(items) => Value::list(items.iter().map(quote)),
    }
}

/// Split `[binding-vector] body...` into the vector's kind and the body.
fn split_vector_head(args: &[Form]) -> Option<(&FormKind, &[Form])> {
    args.split_first().map(|(first, rest)| (&first.kind, rest))
}
