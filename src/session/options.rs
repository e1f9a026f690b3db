use crate::context::Bindings;
use crate::error::ErrorKind;
use crate::eval::Value;
use crate::evaluator::{Evaluator, PatternPolicy};

use std::path::PathBuf;

/// How a session is set up. Every field has a default.
#[derive(Clone, Debug)]
pub struct Options {
    pub prompt: String,
    pub eval_async: bool,
    pub recover_errors: bool,
    pub context: Bindings,
    pub history: Option<PathBuf>,
    pub recover_pattern: Option<PatternPolicy>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prompt: String::from("> "),
            eval_async: true,
            recover_errors: true,
            context: Bindings::new(),
            history: None,
            recover_pattern: None,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt<T: Into<String>>(mut self, prompt: T) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_eval_async(mut self, eval_async: bool) -> Self {
        self.eval_async = eval_async;
        self
    }

    pub fn with_recover_errors(mut self, recover_errors: bool) -> Self {
        self.recover_errors = recover_errors;
        self
    }

    pub fn expose<T: Into<String>, V: Into<Value>>(mut self, name: T, value: V) -> Self {
        self.context.push(name, value);
        self
    }

    pub fn with_history<T: Into<PathBuf>>(mut self, path: T) -> Self {
        self.history = Some(path.into());
        self
    }

    /// Treats syntax errors whose message matches `pattern` as incomplete input.
    pub fn with_recover_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.recover_pattern = Some(PatternPolicy::new(ErrorKind::Syntax, pattern)?);
        Ok(self)
    }

    pub fn evaluator(&self) -> Evaluator {
        let evaluator = Evaluator::new()
            .with_eval_async(self.eval_async)
            .with_recover_errors(self.recover_errors);
        match &self.recover_pattern {
            Some(policy) => evaluator.with_policy(policy.clone()),
            None => evaluator,
        }
    }
}
