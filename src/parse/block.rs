use super::expr::{ident, Expr};
use super::Token;

use combine::{between, choice, many, optional, skip_many, token};
use combine::{Parser, Stream};

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Let(String, Option<Expr>),
    While(Expr, Vec<Self>),
    Break,
    Continue,
    Return(Option<Expr>),
    Throw(Expr),
    Expr(Expr),
}

impl Stmt {
    pub fn parse<I: Stream<Token = Token>>() -> impl Parser<I, Output = Self> {
        choice((
            (
                token(Token::Let),
                ident(),
                optional(token(Token::Assign).with(Expr::parse())),
            )
                .map(|(_, name, init)| Self::Let(name, init)),
            (token(Token::While), Expr::parse(), block())
                .map(|(_, cond, body)| Self::While(cond, body)),
            token(Token::Break).map(|_| Self::Break),
            token(Token::Continue).map(|_| Self::Continue),
            token(Token::Return)
                .with(optional(Expr::parse()))
                .map(Self::Return),
            token(Token::Throw).with(Expr::parse()).map(Self::Throw),
            Expr::parse().map(Self::Expr),
        ))
    }
}

/// A whole chunk: statements separated by optional semicolons.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program(pub Vec<Stmt>);

impl Program {
    pub fn parse<I: Stream<Token = Token>>() -> impl Parser<I, Output = Self> {
        stmts().map(Self)
    }
}

combine::parser! {
    pub fn block[I]()(I) -> Vec<Stmt>
    where [I: Stream<Token = Token>]
    {
        between(token(Token::LBrace), token(Token::RBrace), stmts())
    }
}

fn stmts<I: Stream<Token = Token>>() -> impl Parser<I, Output = Vec<Stmt>> {
    skip_many(token(Token::Semi)).with(many(Stmt::parse().skip(skip_many(token(Token::Semi)))))
}
