extern crate combine;

mod block;
mod check;
mod expr;
mod lex;
mod token;

pub use block::{Program, Stmt};
pub use expr::{BinOp, Expr, FnDef, UnOp};
pub use lex::{END_OF_INPUT, INVALID_TOKEN};
pub use token::Token;

use crate::error::{Error, Result};
use combine::easy::{Error as EasyError, Info};
use combine::{EasyParser, ParseError};
use std::mem;

/// Parses one chunk of input into a program.
///
/// Syntax errors use the same wording as the usual scripting engines so that
/// a recovery policy can tell "the input stopped early" apart from a real
/// mistake.
pub fn parse_chunk(input: &str) -> Result<Program> {
    let tokens = lex::tokenize(input)?;
    check::check_nesting(&tokens)?;

    let program = match Program::parse().easy_parse(&tokens[..]) {
        Ok((program, rem)) => match rem.first() {
            None => program,
            Some(tok) => return Err(tok.unexpected()),
        },
        Err(e) if e.is_unexpected_end_of_input() => return Err(Error::syntax(END_OF_INPUT)),
        Err(e) => {
            let found = e.errors.iter().find_map(|err| match err {
                EasyError::Unexpected(Info::Token(tok)) => Some(tok.unexpected()),
                _ => None,
            });
            return Err(found.unwrap_or_else(|| {
                let offset = e.position.translate_position(&tokens[..]);
                match tokens.get(offset / mem::size_of::<Token>()) {
                    Some(tok) => tok.unexpected(),
                    None => Error::syntax(END_OF_INPUT),
                }
            }));
        }
    };

    check::check_jumps(&program)?;
    Ok(program)
}
