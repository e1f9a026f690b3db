use crate::context::Bindings;
use crate::error::{Error, Result};
use crate::eval::{Native, Value};
use crate::promise::Promise;

use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;

/// Bindings every session starts with, on top of the builtins.
pub fn prelude(local: &Rc<LocalSet>) -> Bindings {
    let local = Rc::clone(local);
    Bindings::new().expose("sleep", Native::new("sleep", move |args| sleep(&local, args)))
}

/// `sleep(ms, value?)`: a promise fulfilled with `value` after `ms` milliseconds.
fn sleep(local: &LocalSet, args: &[Value]) -> Result<Value> {
    let ms = match args.first() {
        None => 0.0,
        Some(Value::Number(n)) if *n >= 0.0 && n.is_finite() => *n,
        Some(other) => {
            return Err(Error::type_(format!(
                "sleep() expects a non-negative number, got {}",
                other.inspect()
            )))
        }
    };
    let delay = Duration::try_from_secs_f64(ms / 1000.0)
        .map_err(|_| Error::range(format!("sleep() delay is out of range: {}", ms)))?;
    let value = args.get(1).cloned().unwrap_or(Value::Null);

    let (promise, resolver) = Promise::pending();
    local.spawn_local(async move {
        tokio::time::sleep(delay).await;
        resolver.resolve(value);
    });
    Ok(promise.into())
}
