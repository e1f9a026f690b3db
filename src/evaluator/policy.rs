use crate::error::ErrorKind;
use crate::parse::END_OF_INPUT;
use regex::Regex;

/// Decides whether a failed chunk only needs more input.
pub trait RecoverPolicy {
    fn is_recoverable(&self, kind: ErrorKind, message: &str) -> bool;
}

impl<F> RecoverPolicy for F
where
    F: Fn(ErrorKind, &str) -> bool,
{
    fn is_recoverable(&self, kind: ErrorKind, message: &str) -> bool {
        self(kind, message)
    }
}

/// Errors of one kind whose message starts with one of a few prefixes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowList {
    kind: ErrorKind,
    prefixes: Vec<String>,
}

impl AllowList {
    pub fn new<T, TS>(kind: ErrorKind, prefixes: TS) -> Self
    where
        T: Into<String>,
        TS: IntoIterator<Item = T>,
    {
        Self {
            kind,
            prefixes: prefixes.into_iter().map(|s| s.into()).collect(),
        }
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(ErrorKind::Syntax, [END_OF_INPUT, "Unexpected token"])
    }
}

impl RecoverPolicy for AllowList {
    fn is_recoverable(&self, kind: ErrorKind, message: &str) -> bool {
        kind == self.kind && self.prefixes.iter().any(|p| message.starts_with(p.as_str()))
    }
}

/// Errors of one kind whose message matches a regular expression.
#[derive(Clone, Debug)]
pub struct PatternPolicy {
    kind: ErrorKind,
    pattern: Regex,
}

impl PatternPolicy {
    pub fn new(kind: ErrorKind, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            kind,
            pattern: Regex::new(pattern)?,
        })
    }
}

impl RecoverPolicy for PatternPolicy {
    fn is_recoverable(&self, kind: ErrorKind, message: &str) -> bool {
        kind == self.kind && self.pattern.is_match(message)
    }
}
