use crate::eval::Value;
use std::collections::HashMap;

/// The bindings every chunk of a session runs against.
///
/// Top-level declarations and assignments land here and stay for the life
/// of the session. Each session owns its own context.
#[derive(Clone, Debug, Default)]
pub struct Context {
    vars: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<T: AsRef<str>>(&self, name: T) -> Option<&Value> {
        self.vars.get(name.as_ref())
    }

    /// Binds `name`, returning whatever it was bound to before.
    pub fn set<T: Into<String>>(&mut self, name: T, value: Value) -> Option<Value> {
        self.vars.insert(name.into(), value)
    }

    pub fn contains<T: AsRef<str>>(&self, name: T) -> bool {
        self.vars.contains_key(name.as_ref())
    }

}

/// Named values handed to a session before it starts, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bindings(Vec<(String, Value)>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expose<T: Into<String>, V: Into<Value>>(mut self, name: T, value: V) -> Self {
        self.push(name, value);
        self
    }

    pub fn push<T: Into<String>, V: Into<Value>>(&mut self, name: T, value: V) {
        self.0.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl<T: Into<String>, V: Into<Value>> FromIterator<(T, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
        let mut bindings = Self::new();
        bindings.extend(iter);
        bindings
    }
}

impl<T: Into<String>, V: Into<Value>> Extend<(T, V)> for Bindings {
    fn extend<I: IntoIterator<Item = (T, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.push(name, value);
        }
    }
}

/// Copies every exposed binding into the context, later entries winning.
pub fn initialize(context: &mut Context, bindings: &Bindings) {
    for (name, value) in bindings.iter() {
        context.set(name, value.clone());
    }
}
