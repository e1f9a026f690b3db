use crate::eval::Value;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Category of a script error, the first thing a recovery policy looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Syntax,
    Reference,
    Type,
    Range,
    Thrown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "SyntaxError",
            Self::Reference => "ReferenceError",
            Self::Type => "TypeError",
            Self::Range => "RangeError",
            Self::Thrown => "Error",
        })
    }
}

/// An error raised while parsing or running a chunk.
///
/// `Thrown` carries whatever value the script passed to `throw` (or the
/// reason a promise was rejected with), untouched.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("SyntaxError: {0}")]
    Syntax(String),
    #[error("ReferenceError: {0}")]
    Reference(String),
    #[error("TypeError: {0}")]
    Type(String),
    #[error("RangeError: {0}")]
    Range(String),
    #[error("{0}")]
    Thrown(Value),
}

impl Error {
    pub fn syntax<T: Into<String>>(message: T) -> Self {
        Self::Syntax(message.into())
    }

    pub fn reference<T: Into<String>>(message: T) -> Self {
        Self::Reference(message.into())
    }

    pub fn type_<T: Into<String>>(message: T) -> Self {
        Self::Type(message.into())
    }

    pub fn range<T: Into<String>>(message: T) -> Self {
        Self::Range(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::Reference(_) => ErrorKind::Reference,
            Self::Type(_) => ErrorKind::Type,
            Self::Range(_) => ErrorKind::Range,
            Self::Thrown(_) => ErrorKind::Thrown,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Syntax(s) | Self::Reference(s) | Self::Type(s) | Self::Range(s) => s.clone(),
            Self::Thrown(value) => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_message() {
        let err = Error::syntax("Unexpected end of input");
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.message(), "Unexpected end of input");
        assert_eq!(err.to_string(), "SyntaxError: Unexpected end of input");
    }

    #[test]
    fn thrown_value_is_the_message() {
        let err = Error::Thrown(Value::from("boom"));
        assert_eq!(err.kind(), ErrorKind::Thrown);
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "boom");
    }
}
