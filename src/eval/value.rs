use super::Scope;
use crate::error::Result;
use crate::parse::FnDef;
use crate::promise::{HostObject, Thenable};

use std::cell::RefCell;
use std::fmt;
use std::ptr;
use std::rc::Rc;
use std::thread::LocalKey;

/// A script value.
///
/// Lists are shared: every copy of a list value sees pushes made through any
/// other copy, the same way objects behave in the usual scripting engines.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Closure>),
    Native(Native),
    Object(Rc<dyn HostObject>),
}

/// A `fn` literal together with the block scopes it was created in.
pub struct Closure {
    pub def: Rc<FnDef>,
    pub(super) captured: Vec<Scope>,
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

/// A function implemented by the host.
#[derive(Clone)]
pub struct Native {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl Native {
    pub fn new<T, F>(name: T, func: F) -> Self
    where
        T: AsRef<str>,
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Self {
            name: Rc::from(name.as_ref()),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Native({})", self.name)
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure({})", self.def.params.join(", "))
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Self::List(Rc::new(RefCell::new(items)))
    }

    pub fn object<T: HostObject + 'static>(object: T) -> Self {
        Self::Object(Rc::new(object))
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Function(_) | Self::Native(_) => "function",
            Self::Object(o) => o.type_name(),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// The continuation-registration capability, if this value has one.
    pub fn thenable(&self) -> Option<&dyn Thenable> {
        match self {
            Self::Object(o) => o.as_thenable(),
            _ => None,
        }
    }

    /// How the session shows a result: like `Display`, but strings are quoted.
    pub fn inspect(&self) -> String {
        match self {
            Self::Str(s) => format!("{:?}", s),
            other => other.to_string(),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        f.write_str("0")
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => fmt_number(*n, f),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                let key = (Rc::as_ptr(items) as *const (), ptr::null());
                guarded(&SHOWING, key, || {
                    f.write_str("[")?;
                    for (i, item) in items.borrow().iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        f.write_str(&item.inspect())?;
                    }
                    f.write_str("]")
                })
                .unwrap_or_else(|| f.write_str("[Circular]"))
            }
            Self::Function(_) => f.write_str("[Function]"),
            Self::Native(native) => write!(f, "[Function: {}]", native.name()),
            Self::Object(o) => f.write_str(&o.describe()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inspect())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => {
                let key = (Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ());
                Rc::ptr_eq(a, b)
                    || guarded(&COMPARING, key, || *a.borrow() == *b.borrow()).unwrap_or(true)
            }
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Native(a), Self::Native(b)) => same_rc(&a.func, &b.func),
            (Self::Object(a), Self::Object(b)) => same_rc(a, b),
            _ => false,
        }
    }
}

type Walk = RefCell<Vec<(*const (), *const ())>>;

thread_local! {
    static SHOWING: Walk = RefCell::new(Vec::new());
    static COMPARING: Walk = RefCell::new(Vec::new());
}

/// Runs `f` with `key` marked as in progress on `walk`, or returns `None`
/// if it already is. Lists can contain themselves, so walking them needs
/// to notice when it comes back around.
fn guarded<T, F>(walk: &'static LocalKey<Walk>, key: (*const (), *const ()), f: F) -> Option<T>
where
    F: FnOnce() -> T,
{
    let entered = walk.with(|w| {
        let mut w = w.borrow_mut();
        if w.contains(&key) {
            false
        } else {
            w.push(key);
            true
        }
    });
    if !entered {
        return None;
    }

    let res = f();
    walk.with(|w| w.borrow_mut().pop());
    Some(res)
}

fn same_rc<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::list(items)
    }
}

impl From<Native> for Value {
    fn from(native: Native) -> Self {
        Self::Native(native)
    }
}
