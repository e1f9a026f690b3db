//! The evaluation hook a line session calls for every chunk.
//!
//! A chunk either fails, produces a plain value, or produces something that
//! settles later. All three end up in one callback, invoked exactly once.

mod policy;

pub use policy::{AllowList, PatternPolicy, RecoverPolicy};

use crate::context::Context;
use crate::error::Error;
use crate::eval::{self, Value};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, debug_span, warn};

/// Why a chunk did not produce a value.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Rejection {
    /// The chunk stopped early; the session should read more lines.
    #[error("incomplete input ({0})")]
    Recoverable(Error),
    #[error(transparent)]
    Error(#[from] Error),
}

/// What became of one evaluation request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Value(Value),
    Error(Error),
    Incomplete,
}

impl From<Result<Value, Rejection>> for Outcome {
    fn from(res: Result<Value, Rejection>) -> Self {
        match res {
            Ok(value) => Self::Value(value),
            Err(Rejection::Recoverable(_)) => Self::Incomplete,
            Err(Rejection::Error(err)) => Self::Error(err),
        }
    }
}

pub struct Evaluator {
    eval_async: bool,
    recover_errors: bool,
    policy: Box<dyn RecoverPolicy>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self {
            eval_async: true,
            recover_errors: true,
            policy: Box::new(AllowList::default()),
        }
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator")
            .field("eval_async", &self.eval_async)
            .field("recover_errors", &self.recover_errors)
            .finish_non_exhaustive()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether promise-like results are awaited or handed back as they are.
    pub fn with_eval_async(mut self, eval_async: bool) -> Self {
        self.eval_async = eval_async;
        self
    }

    /// Whether any failure may be reported as incomplete input.
    pub fn with_recover_errors(mut self, recover_errors: bool) -> Self {
        self.recover_errors = recover_errors;
        self
    }

    pub fn with_policy<P: RecoverPolicy + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Runs `chunk` against `context` and reports the result to `callback`.
    ///
    /// The callback runs before this returns unless the chunk produced a
    /// pending promise-like value, in which case it runs when that value
    /// settles. It never runs twice, whatever the promise-like value does.
    pub fn evaluate<F>(&self, chunk: &str, context: &mut Context, label: &str, callback: F)
    where
        F: FnOnce(Result<Value, Rejection>) + 'static,
    {
        let span = debug_span!("evaluate", label);
        let _enter = span.enter();

        let callback = Once::new(callback);
        let value = match eval::run(chunk, context) {
            Ok(value) => value,
            Err(err) => {
                callback.call(Err(self.classify(err)));
                return;
            }
        };

        if self.eval_async {
            if let Some(thenable) = value.thenable() {
                debug!("awaiting a promise-like result");
                let on_rejected = callback.clone();
                thenable.then(
                    Box::new(move |value| callback.call(Ok(value))),
                    Box::new(move |err| on_rejected.call(Err(Rejection::Error(err)))),
                );
                return;
            }
        }

        callback.call(Ok(value));
    }

    /// Evaluates and returns the outcome if it was delivered right away.
    ///
    /// `None` means the chunk produced a promise-like value that is still
    /// pending.
    pub fn evaluate_now(&self, chunk: &str, context: &mut Context, label: &str) -> Option<Outcome> {
        let slot = Rc::new(RefCell::new(None));
        let out = Rc::clone(&slot);
        self.evaluate(chunk, context, label, move |res| {
            *out.borrow_mut() = Some(Outcome::from(res));
        });
        slot.take()
    }

    fn classify(&self, err: Error) -> Rejection {
        if self.recover_errors && self.policy.is_recoverable(err.kind(), &err.message()) {
            debug!(error = %err, "treating failure as incomplete input");
            Rejection::Recoverable(err)
        } else {
            Rejection::Error(err)
        }
    }
}

/// A callback shared between continuations that runs at most once.
struct Once<F>(Rc<Cell<Option<F>>>);

impl<F> Clone for Once<F> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<F: FnOnce(Result<Value, Rejection>)> Once<F> {
    fn new(f: F) -> Self {
        Self(Rc::new(Cell::new(Some(f))))
    }

    fn call(&self, res: Result<Value, Rejection>) {
        match self.0.take() {
            Some(f) => f(res),
            None => warn!("ignoring a second settlement of the same evaluation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{initialize, Bindings};
    use crate::error::ErrorKind;
    use crate::promise::{HostObject, OnFulfilled, OnRejected, Promise, Thenable};
    use pretty_assertions::assert_eq;

    fn now(evaluator: &Evaluator, context: &mut Context, chunk: &str) -> Outcome {
        evaluator.evaluate_now(chunk, context, "test").unwrap()
    }

    #[test]
    fn recoverable_syntax_errors() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        for chunk in ["{", "let x = [1,", "f(", "fn(a) {", "\"\"\"open", "/* open"] {
            assert_eq!(now(&evaluator, &mut context, chunk), Outcome::Incomplete, "{}", chunk);
        }
        assert_eq!(now(&evaluator, &mut context, "1 + )"), Outcome::Incomplete);
    }

    #[test]
    fn other_syntax_errors_are_reported() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        assert_eq!(
            now(&evaluator, &mut context, "f(1 2)"),
            Outcome::Error(Error::syntax("Unexpected number"))
        );
        assert_eq!(
            now(&evaluator, &mut context, "\"open"),
            Outcome::Error(Error::syntax("Invalid or unexpected token"))
        );
        assert_eq!(
            now(&evaluator, &mut context, "break"),
            Outcome::Error(Error::syntax("Illegal break statement"))
        );
    }

    #[test]
    fn runtime_errors_are_never_incomplete() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        assert_eq!(
            now(&evaluator, &mut context, "nope"),
            Outcome::Error(Error::reference("nope is not defined"))
        );
        assert_eq!(
            now(&evaluator, &mut context, "throw \"Unexpected end of input\""),
            Outcome::Error(Error::Thrown(Value::from("Unexpected end of input")))
        );
    }

    #[test]
    fn recovery_can_be_turned_off() {
        let evaluator = Evaluator::new().with_recover_errors(false);
        let mut context = Context::new();
        assert_eq!(
            now(&evaluator, &mut context, "{"),
            Outcome::Error(Error::syntax("Unexpected end of input"))
        );
    }

    #[test]
    fn custom_policy() {
        let evaluator =
            Evaluator::new().with_policy(|kind: ErrorKind, _: &str| kind == ErrorKind::Reference);
        let mut context = Context::new();
        assert_eq!(now(&evaluator, &mut context, "missing"), Outcome::Incomplete);
        assert_eq!(
            now(&evaluator, &mut context, "{"),
            Outcome::Error(Error::syntax("Unexpected end of input"))
        );
    }

    #[test]
    fn plain_values_are_synchronous() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        assert_eq!(now(&evaluator, &mut context, "1 + 1"), Outcome::Value(Value::from(2)));
        assert_eq!(now(&evaluator, &mut context, ""), Outcome::Value(Value::Null));
    }

    #[test]
    fn declarations_persist() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        assert_eq!(now(&evaluator, &mut context, "let x = 1"), Outcome::Value(Value::Null));
        assert_eq!(now(&evaluator, &mut context, "x + 1"), Outcome::Value(Value::from(2)));
    }

    #[test]
    fn exposed_bindings() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        initialize(
            &mut context,
            &Bindings::new().expose("foo", 42).expose("a", 1).expose("a", 2),
        );
        assert_eq!(now(&evaluator, &mut context, "foo"), Outcome::Value(Value::from(42)));
        assert_eq!(now(&evaluator, &mut context, "a"), Outcome::Value(Value::from(2)));
    }

    #[test]
    fn side_effects_before_a_throw_persist() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        let outcome = now(&evaluator, &mut context, "let done = 1; throw \"late\"");
        assert_eq!(outcome, Outcome::Error(Error::Thrown(Value::from("late"))));
        assert_eq!(context.get("done"), Some(&Value::from(1)));
    }

    #[test]
    fn settled_promises() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        assert_eq!(
            now(&evaluator, &mut context, "resolve(7)"),
            Outcome::Value(Value::from(7))
        );
        assert_eq!(
            now(&evaluator, &mut context, "reject(\"Unexpected end of input\")"),
            Outcome::Error(Error::Thrown(Value::from("Unexpected end of input")))
        );
    }

    #[test]
    fn promises_are_values_without_async() {
        let evaluator = Evaluator::new().with_eval_async(false);
        let mut context = Context::new();
        match now(&evaluator, &mut context, "resolve(7)") {
            Outcome::Value(value) => assert_eq!(value.to_string(), "Promise { 7 }"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn pending_promises_deliver_later() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        let (promise, resolver) = Promise::pending();
        context.set("p", promise.into());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let out = Rc::clone(&seen);
        evaluator.evaluate("p", &mut context, "test", move |res| {
            out.borrow_mut().push(Outcome::from(res));
        });
        assert!(seen.borrow().is_empty());
        assert_eq!(evaluator.evaluate_now("p", &mut context, "test"), None);

        resolver.resolve(Value::from("done"));
        assert_eq!(*seen.borrow(), vec![Outcome::Value(Value::from("done"))]);
    }

    #[test]
    fn pending_promises_reject_later() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        let (promise, resolver) = Promise::pending();
        context.set("p", promise.into());

        let seen = Rc::new(RefCell::new(Vec::new()));
        let out = Rc::clone(&seen);
        evaluator.evaluate("p", &mut context, "test", move |res| {
            out.borrow_mut().push(Outcome::from(res));
        });
        assert!(seen.borrow().is_empty());

        resolver.reject(Error::syntax("Unexpected end of input"));
        resolver.resolve(Value::from("too late"));
        assert_eq!(*seen.borrow(), vec![Outcome::Error(Error::syntax("Unexpected end of input"))]);
    }

    #[derive(Debug)]
    struct Unruly;

    impl Thenable for Unruly {
        fn then(&self, on_fulfilled: OnFulfilled, on_rejected: OnRejected) {
            on_fulfilled(Value::from(1));
            on_rejected(Error::type_("again"));
        }
    }

    impl HostObject for Unruly {
        fn type_name(&self) -> &str {
            "Unruly"
        }

        fn as_thenable(&self) -> Option<&dyn Thenable> {
            Some(self)
        }
    }

    #[test]
    fn callback_runs_once() {
        let evaluator = Evaluator::new();
        let mut context = Context::new();
        context.set("u", Value::object(Unruly));

        let calls = Rc::new(Cell::new(0));
        let count = Rc::clone(&calls);
        evaluator.evaluate("u", &mut context, "test", move |res| {
            assert_eq!(res, Ok(Value::from(1)));
            count.set(count.get() + 1);
        });
        assert_eq!(calls.get(), 1);
    }
}
