//! The compiled tree produced by the analyzer.
//!
//! Every name is resolved, every special form is validated, and every call to
//! a built-in has had its arity checked. The tree holds no interior
//! mutability, so it can be shared freely between threads.

use std::sync::Arc;

use ecow::EcoString;

use crate::parser::Span;
use crate::values::{NativeFunction, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Literal, quoted form or engine global, folded at compile time.
    Constant(Value),
    /// Bound by an enclosing `let`, `fn` parameter list or closure capture.
    Local(EcoString),
    /// Read from the call's binding.
    Free(EcoString),
    /// `[a b c]`
    List(Vec<Node>),
    If {
        cond: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    Do(Vec<Node>),
    Let {
        bindings: Vec<(EcoString, Node)>,
        body: Vec<Node>,
    },
    Lambda(Arc<Lambda>),
    And(Vec<Node>),
    Or(Vec<Node>),
    /// Call to a built-in resolved at compile time.
    CallNative {
        function: Arc<NativeFunction>,
        args: Vec<Node>,
    },
    /// Call through a value computed at run time.
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
}

/// A compiled `fn` form.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<EcoString>,
    /// Outer names (locals or free variables) the body reads, sorted.
    pub captures: Vec<EcoString>,
    pub body: Vec<Node>,
    pub span: Span,
}

/// A name the script reads from its binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeVariable {
    pub name: EcoString,
    /// First occurrence in the source.
    pub span: Span,
}
