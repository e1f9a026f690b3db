use super::{Expr, Program, Stmt, Token};
use crate::error::{Error, Result};

/// How deep brackets and prefix operators may nest in one chunk.
pub const MAX_NESTING: usize = 48;

/// Refuses token streams that would nest the recursive parser too deeply.
///
/// Open brackets count until they are closed. A run of `!` or `-` counts
/// for its length on top of the brackets around it.
pub fn check_nesting(tokens: &[Token]) -> Result<()> {
    let mut brackets = 0usize;
    let mut prefix = 0usize;

    for tok in tokens {
        match tok {
            Token::LParen | Token::LBracket | Token::LBrace => {
                brackets += 1;
                prefix = 0;
            }
            Token::RParen | Token::RBracket | Token::RBrace => {
                brackets = brackets.saturating_sub(1);
                prefix = 0;
            }
            Token::Bang | Token::Minus => prefix += 1,
            _ => prefix = 0,
        }

        if brackets + prefix > MAX_NESTING {
            return Err(Error::range("Maximum call stack size exceeded"));
        }
    }

    Ok(())
}

#[derive(Clone, Copy, Default)]
struct Within {
    loop_: bool,
    function: bool,
}

/// Rejects `break`, `continue` and `return` that have nothing to jump out of,
/// so a chunk containing one fails before any of it runs.
pub fn check_jumps(program: &Program) -> Result<()> {
    stmts(&program.0, Within::default())
}

fn stmts(body: &[Stmt], within: Within) -> Result<()> {
    body.iter().try_for_each(|s| stmt(s, within))
}

fn stmt(s: &Stmt, within: Within) -> Result<()> {
    match s {
        Stmt::Let(_, init) => init.iter().try_for_each(|e| expr(e, within)),
        Stmt::While(cond, body) => {
            expr(cond, within)?;
            stmts(
                body,
                Within {
                    loop_: true,
                    ..within
                },
            )
        }
        Stmt::Break if !within.loop_ => Err(Error::syntax("Illegal break statement")),
        Stmt::Continue if !within.loop_ => Err(Error::syntax(
            "Illegal continue statement: no surrounding iteration statement",
        )),
        Stmt::Break | Stmt::Continue => Ok(()),
        Stmt::Return(_) if !within.function => Err(Error::syntax("Illegal return statement")),
        Stmt::Return(value) => value.iter().try_for_each(|e| expr(e, within)),
        Stmt::Throw(e) | Stmt::Expr(e) => expr(e, within),
    }
}

fn expr(e: &Expr, within: Within) -> Result<()> {
    match e {
        Expr::Null | Expr::Bool(_) | Expr::Number(_) | Expr::Str(_) | Expr::Var(_) => Ok(()),
        Expr::List(items) => items.iter().try_for_each(|e| expr(e, within)),
        Expr::Assign(_, value) | Expr::Unary(_, value) => expr(value, within),
        Expr::Binary(_, lhs, rhs) | Expr::Index(lhs, rhs) => {
            expr(lhs, within)?;
            expr(rhs, within)
        }
        Expr::Call(callee, args) => {
            expr(callee, within)?;
            args.iter().try_for_each(|e| expr(e, within))
        }
        Expr::Block(body) => stmts(body, within),
        Expr::If(cond, then, other) => {
            expr(cond, within)?;
            stmts(then, within)?;
            other.iter().try_for_each(|e| expr(e, within))
        }
        Expr::Fn(def) => stmts(
            &def.body,
            Within {
                loop_: false,
                function: true,
            },
        ),
    }
}
