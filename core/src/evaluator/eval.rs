//! Core evaluation logic.

use std::sync::Arc;
use std::time::Instant;

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;
use ecow::EcoString;
use smallvec::SmallVec;

use crate::analyzer::{Lambda, Node, NodeKind};
use crate::api::{Binding, ExecutionOptions};
use crate::evaluator::{EvaluationError, RuntimeFault};
use crate::parser::Span;
use crate::scope_stack::{CompleteScope, IncompleteScope, ScopeStack};
use crate::values::{Closure, Function, NativeFunction, Value};

/// Steps between two wall-clock checks when a timeout is set.
const TIMEOUT_CHECK_INTERVAL: u64 = 256;

/// Native stack one evaluation may use, whatever `max_depth` allows.
///
/// Frame sizes differ a lot between debug and release builds, so the depth
/// count alone cannot keep a 2 MiB thread from overflowing.
const STACK_BUDGET: usize = 1024 * 1024;

type Args = SmallVec<[Value; 4]>;

/// Rough position of the native stack pointer.
#[inline(always)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}

/// Scopes of one function activation.
///
/// The arena backs scope storage and is dropped with the activation, so
/// memory follows the live call depth rather than the number of calls made.
pub(crate) struct Frame<'f> {
    arena: &'f Bump,
    scopes: ScopeStack<'f, Value>,
}

impl<'f> Frame<'f> {
    pub(crate) fn new(arena: &'f Bump) -> Self {
        Self {
            arena,
            scopes: ScopeStack::new(),
        }
    }
}

/// Per-call evaluator. Everything it owns lives and dies with one
/// `evaluate` call.
pub(crate) struct Evaluator<'a> {
    options: &'a ExecutionOptions,
    script: &'a EcoString,
    binding: &'a Binding,
    depth: usize,
    steps: u64,
    started: Instant,
    stack_base: usize,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        options: &'a ExecutionOptions,
        script: &'a EcoString,
        binding: &'a Binding,
    ) -> Self {
        Self {
            options,
            script,
            binding,
            depth: 0,
            steps: 0,
            started: Instant::now(),
            stack_base: stack_position(),
        }
    }

    /// Evaluate a script body in a fresh top-level frame.
    pub(crate) fn run(&mut self, body: &Node) -> Result<Value, EvaluationError> {
        let arena = Bump::new();
        let mut frame = Frame::new(&arena);
        self.eval(body, &mut frame)
    }

    fn fault(&self, cause: RuntimeFault, span: &Span) -> EvaluationError {
        EvaluationError::RuntimeFault {
            script: self.script.clone(),
            cause,
            span: span.clone(),
        }
    }

    fn unbound(&self, name: &EcoString, span: &Span) -> EvaluationError {
        EvaluationError::UnboundSymbol {
            script: self.script.clone(),
            name: name.clone(),
            span: span.clone(),
        }
    }

    fn scope_fault(&self, err: impl ToString, span: &Span) -> EvaluationError {
        self.fault(RuntimeFault::custom(err.to_string()), span)
    }

    /// Evaluate a node, enforcing the depth, stack, step and time limits.
    pub(crate) fn eval(
        &mut self,
        node: &Node,
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        // Check depth before recursing
        if self.depth >= self.options.max_depth
            || self.stack_base.abs_diff(stack_position()) > STACK_BUDGET
        {
            return Err(self.fault(
                RuntimeFault::StackOverflow {
                    depth: self.depth,
                    max_depth: self.options.max_depth,
                },
                &node.span,
            ));
        }
        self.tick(&node.span)?;

        self.depth += 1;
        let result = self.eval_inner(node, frame);
        self.depth -= 1;

        result
    }

    fn tick(&mut self, span: &Span) -> Result<(), EvaluationError> {
        self.steps += 1;
        if let Some(max_steps) = self.options.max_steps
            && self.steps > max_steps
        {
            return Err(self.fault(RuntimeFault::StepLimitExceeded { max_steps }, span));
        }
        if let Some(timeout) = self.options.timeout
            && self.steps % TIMEOUT_CHECK_INTERVAL == 0
        {
            let elapsed = self.started.elapsed();
            if elapsed > timeout {
                return Err(self.fault(RuntimeFault::Timeout { elapsed, timeout }, span));
            }
        }
        Ok(())
    }

    // Only dispatches; each arm lives in its own function so that the
    // recursive path keeps small native frames.
    fn eval_inner(&mut self, node: &Node, frame: &mut Frame<'_>) -> Result<Value, EvaluationError> {
        match &node.kind {
            NodeKind::Constant(value) => Ok(value.clone()),
            NodeKind::Local(name) => match frame.scopes.lookup(name) {
                Some(value) => Ok(value.clone()),
                None => Err(self.unbound(name, &node.span)),
            },
            NodeKind::Free(name) => match self.binding.get(name) {
                Some(value) => Ok(value.clone()),
                None => Err(self.unbound(name, &node.span)),
            },
            NodeKind::List(items) => self.eval_list(items, frame),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.eval_if(cond, then_branch, else_branch.as_deref(), frame),
            NodeKind::Do(body) => self.eval_body(body, frame),
            NodeKind::Let { bindings, body } => self.eval_let(bindings, body, &node.span, frame),
            NodeKind::Lambda(lambda) => self.make_closure(lambda, &node.span, frame),
            NodeKind::And(items) => self.eval_and(items, frame),
            NodeKind::Or(items) => self.eval_or(items, frame),
            NodeKind::CallNative { function, args } => {
                self.eval_call_native(function, args, &node.span, frame)
            }
            NodeKind::Call { callee, args } => self.eval_call(callee, args, &node.span, frame),
        }
    }

    fn eval_list(
        &mut self,
        items: &[Node],
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            values.push(self.eval(item, frame)?);
        }
        Ok(Value::list(values))
    }

    fn eval_if(
        &mut self,
        cond: &Node,
        then_branch: &Node,
        else_branch: Option<&Node>,
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        if self.eval(cond, frame)?.is_truthy() {
            self.eval(then_branch, frame)
        } else if let Some(else_branch) = else_branch {
            self.eval(else_branch, frame)
        } else {
            Ok(Value::Nil)
        }
    }

    fn eval_and(
        &mut self,
        items: &[Node],
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        let mut last = Value::Bool(true);
        for item in items {
            last = self.eval(item, frame)?;
            if !last.is_truthy() {
                break;
            }
        }
        Ok(last)
    }

    fn eval_or(&mut self, items: &[Node], frame: &mut Frame<'_>) -> Result<Value, EvaluationError> {
        let mut last = Value::Nil;
        for item in items {
            last = self.eval(item, frame)?;
            if last.is_truthy() {
                break;
            }
        }
        Ok(last)
    }

    fn eval_body(
        &mut self,
        body: &[Node],
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        let mut last = Value::Nil;
        for node in body {
            last = self.eval(node, frame)?;
        }
        Ok(last)
    }

    fn eval_args(&mut self, args: &[Node], frame: &mut Frame<'_>) -> Result<Args, EvaluationError> {
        let mut values = Args::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, frame)?);
        }
        Ok(values)
    }

    fn eval_let(
        &mut self,
        bindings: &[(EcoString, Node)],
        body: &[Node],
        span: &Span,
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        let arena = frame.arena;
        let names: Vec<&str> = bindings
            .iter()
            .map(|(name, _)| &*arena.alloc_str(name))
            .collect();
        let scope = IncompleteScope::new(arena, &names).map_err(|err| self.scope_fault(err, span))?;

        frame.scopes.push(scope);
        let result = self.bind_and_run(bindings, body, span, frame);
        let popped = frame.scopes.pop();
        debug_assert!(popped.is_ok(), "let scope missing from the stack");
        result
    }

    fn bind_and_run(
        &mut self,
        bindings: &[(EcoString, Node)],
        body: &[Node],
        span: &Span,
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        for (name, value) in bindings {
            let value = self.eval(value, frame)?;
            frame
                .scopes
                .bind_in_current(name, value)
                .map_err(|err| self.scope_fault(err, span))?;
        }
        self.eval_body(body, frame)
    }

    /// Snapshot the captured names into a closure value.
    fn make_closure(
        &self,
        lambda: &Arc<Lambda>,
        span: &Span,
        frame: &Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        let mut captured = Vec::with_capacity(lambda.captures.len());
        for name in &lambda.captures {
            let value = frame
                .scopes
                .lookup(name)
                .or_else(|| self.binding.get(name))
                .cloned()
                .ok_or_else(|| self.unbound(name, span))?;
            captured.push((name.clone(), value));
        }
        Ok(Value::Function(Function::Closure(Arc::new(Closure::new(
            Arc::clone(lambda),
            captured,
        )))))
    }

    /// Call a global resolved at compile time; its arity was checked then.
    fn eval_call_native(
        &mut self,
        function: &NativeFunction,
        args: &[Node],
        span: &Span,
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        let args = self.eval_args(args, frame)?;
        function
            .call_unchecked(&args)
            .map_err(|cause| self.fault(cause, span))
    }

    fn eval_call(
        &mut self,
        callee: &Node,
        args: &[Node],
        span: &Span,
        frame: &mut Frame<'_>,
    ) -> Result<Value, EvaluationError> {
        let callee = self.eval(callee, frame)?;
        let args = self.eval_args(args, frame)?;
        self.apply(&callee, &args, span)
    }

    /// Call a function value computed at run time.
    fn apply(
        &mut self,
        callee: &Value,
        args: &[Value],
        span: &Span,
    ) -> Result<Value, EvaluationError> {
        let Value::Function(function) = callee else {
            return Err(self.fault(
                RuntimeFault::NotCallable {
                    found: callee.type_name().into(),
                },
                span,
            ));
        };

        let arity = function.arity();
        if !arity.accepts(args.len()) {
            let name = function.name().cloned().unwrap_or_else(|| "fn".into());
            return Err(self.fault(
                RuntimeFault::ArityMismatch {
                    function: name,
                    expected: arity,
                    found: args.len(),
                },
                span,
            ));
        }

        match function {
            Function::Native(native) => native
                .call_unchecked(args)
                .map_err(|cause| self.fault(cause, span)),
            Function::Closure(closure) => self.call_closure(closure, args, span),
        }
    }

    /// Run a closure body in a new frame holding only its captures and
    /// parameters. The frame and its arena are gone once the call returns.
    fn call_closure(
        &mut self,
        closure: &Closure,
        args: &[Value],
        span: &Span,
    ) -> Result<Value, EvaluationError> {
        let arena = Bump::new();
        let mut frame = Frame::new(&arena);

        let mut captured = BumpVec::with_capacity_in(closure.captured.len(), &arena);
        captured.extend(
            closure
                .captured
                .iter()
                .map(|(name, value)| (name.as_str(), value.clone())),
        );

        let params = CompleteScope::from_unsorted(
            &arena,
            closure
                .lambda
                .params
                .iter()
                .map(EcoString::as_str)
                .zip(args.iter().cloned()),
        )
        .map_err(|err| self.scope_fault(err, span))?;

        frame.scopes.push(CompleteScope::from_sorted(captured));
        frame.scopes.push(params);
        self.eval_body(&closure.lambda.body, &mut frame)
    }
}
