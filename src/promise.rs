//! The promise-like capability.
//!
//! The evaluator never looks for a concrete promise type. It asks a result
//! value whether it can register continuations (`HostObject::as_thenable`)
//! and, if so, waits on it. `Promise` is the implementation the builtins
//! hand out; embedders can expose their own `Thenable` objects.

use crate::error::Error;
use crate::eval::Value;

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

pub type OnFulfilled = Box<dyn FnOnce(Value)>;
pub type OnRejected = Box<dyn FnOnce(Error)>;

/// Something that settles later and can notify whoever is interested.
pub trait Thenable {
    /// Registers continuations. At most one of them is expected to run, once.
    fn then(&self, on_fulfilled: OnFulfilled, on_rejected: OnRejected);
}

/// A value owned by the host and handed to scripts opaquely.
pub trait HostObject: fmt::Debug {
    fn type_name(&self) -> &str;

    fn describe(&self) -> String {
        format!("[object {}]", self.type_name())
    }

    fn as_thenable(&self) -> Option<&dyn Thenable> {
        None
    }
}

enum State {
    Pending(Vec<(OnFulfilled, OnRejected)>),
    Fulfilled(Value),
    Rejected(Error),
}

#[derive(Clone)]
pub struct Promise(Rc<RefCell<State>>);

/// The settling half of a pending `Promise`.
#[derive(Clone, Debug)]
pub struct Resolver(Promise);

impl Promise {
    pub fn pending() -> (Self, Resolver) {
        let promise = Self(Rc::new(RefCell::new(State::Pending(Vec::new()))));
        (promise.clone(), Resolver(promise))
    }

    pub fn resolved(value: Value) -> Self {
        Self(Rc::new(RefCell::new(State::Fulfilled(value))))
    }

    pub fn rejected(reason: Error) -> Self {
        Self(Rc::new(RefCell::new(State::Rejected(reason))))
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.0.borrow(), State::Pending(_))
    }

    fn settle(&self, result: Result<Value, Error>) {
        let waiting = {
            let mut state = self.0.borrow_mut();
            if !matches!(*state, State::Pending(_)) {
                return;
            }
            let next = match &result {
                Ok(value) => State::Fulfilled(value.clone()),
                Err(reason) => State::Rejected(reason.clone()),
            };
            match mem::replace(&mut *state, next) {
                State::Pending(waiting) => waiting,
                _ => Vec::new(),
            }
        };

        for (on_fulfilled, on_rejected) in waiting {
            match &result {
                Ok(value) => on_fulfilled(value.clone()),
                Err(reason) => on_rejected(reason.clone()),
            }
        }
    }
}

impl Resolver {
    /// Fulfills the promise. Does nothing if it has already settled.
    pub fn resolve(&self, value: Value) {
        self.0.settle(Ok(value));
    }

    /// Rejects the promise. Does nothing if it has already settled.
    pub fn reject(&self, reason: Error) {
        self.0.settle(Err(reason));
    }
}

impl Thenable for Promise {
    fn then(&self, on_fulfilled: OnFulfilled, on_rejected: OnRejected) {
        let settled = {
            let mut state = self.0.borrow_mut();
            match &mut *state {
                State::Pending(waiting) => {
                    waiting.push((on_fulfilled, on_rejected));
                    return;
                }
                State::Fulfilled(value) => Ok(value.clone()),
                State::Rejected(reason) => Err(reason.clone()),
            }
        };

        match settled {
            Ok(value) => on_fulfilled(value),
            Err(reason) => on_rejected(reason),
        }
    }
}

impl HostObject for Promise {
    fn type_name(&self) -> &str {
        "Promise"
    }

    fn describe(&self) -> String {
        match &*self.0.borrow() {
            State::Pending(_) => String::from("Promise { <pending> }"),
            State::Fulfilled(value) => format!("Promise {{ {} }}", value.inspect()),
            State::Rejected(reason) => format!("Promise {{ <rejected> {} }}", reason),
        }
    }

    fn as_thenable(&self) -> Option<&dyn Thenable> {
        Some(self)
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::object(promise)
    }
}
