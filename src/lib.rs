//! An embeddable interactive evaluation session.
//!
//! Chunks of a small scripting language run against a persistent
//! [`Context`]. The [`Evaluator`] tells input that merely stopped early apart
//! from real mistakes, and waits on promise-like results before reporting.
//! [`Session`] wires it to a line reader.

pub mod context;
pub mod error;
pub mod eval;
pub mod evaluator;
pub mod parse;
pub mod promise;
pub mod session;

pub use context::{initialize, Bindings, Context};
pub use error::{Error, ErrorKind, Result};
pub use eval::Value;
pub use evaluator::{Evaluator, Outcome, Rejection};
pub use session::{IOReader, Options, PromptReader, Reader, Session};
