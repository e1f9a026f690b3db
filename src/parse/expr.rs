use super::block::{block, Stmt};
use super::Token;

use combine::{attempt, between, chainl1, choice, many, optional, satisfy_map, sep_end_by, token};
use combine::{Parser, Stream};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Parameters and body of a `fn` literal, shared by every closure made from it.
#[derive(Clone, Debug, PartialEq)]
pub struct FnDef {
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Self>),
    Var(String),
    Assign(String, Box<Self>),
    Unary(UnOp, Box<Self>),
    Binary(BinOp, Box<Self>, Box<Self>),
    Call(Box<Self>, Vec<Self>),
    Index(Box<Self>, Box<Self>),
    Block(Vec<Stmt>),
    If(Box<Self>, Vec<Stmt>, Option<Box<Self>>),
    Fn(Rc<FnDef>),
}

impl Expr {
    pub fn parse<I: Stream<Token = Token>>() -> impl Parser<I, Output = Self> {
        expr()
    }
}

combine::parser! {
    fn expr[I]()(I) -> Expr
    where [I: Stream<Token = Token>]
    {
        assign()
    }
}

combine::parser! {
    fn unary[I]()(I) -> Expr
    where [I: Stream<Token = Token>]
    {
        choice((
            token(Token::Bang)
                .with(unary())
                .map(|e| Expr::Unary(UnOp::Not, Box::new(e))),
            token(Token::Minus)
                .with(unary())
                .map(|e| Expr::Unary(UnOp::Neg, Box::new(e))),
            postfix(),
        ))
    }
}

combine::parser! {
    fn if_[I]()(I) -> Expr
    where [I: Stream<Token = Token>]
    {
        (
            token(Token::If),
            expr(),
            block(),
            optional(token(Token::Else).with(if_().or(block().map(Expr::Block)))),
        )
            .map(|(_, cond, then, other)| Expr::If(Box::new(cond), then, other.map(Box::new)))
    }
}

pub fn ident<I: Stream<Token = Token>>() -> impl Parser<I, Output = String> {
    satisfy_map(|tok: Token| match tok {
        Token::Ident(name) => Some(name),
        _ => None,
    })
}

fn assign<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    attempt(ident().skip(token(Token::Assign)))
        .and(expr())
        .map(|(name, value)| Expr::Assign(name, Box::new(value)))
        .or(or_())
}

fn op<I: Stream<Token = Token>>(tok: Token, op: BinOp) -> impl Parser<I, Output = BinOp> {
    token(tok).map(move |_| op)
}

fn binary<I, P, O>(operand: P, ops: O) -> impl Parser<I, Output = Expr>
where
    I: Stream<Token = Token>,
    P: Parser<I, Output = Expr>,
    O: Parser<I, Output = BinOp>,
{
    chainl1(
        operand,
        ops.map(|op| move |lhs: Expr, rhs: Expr| Expr::Binary(op, Box::new(lhs), Box::new(rhs))),
    )
}

fn or_<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    binary(and_(), op(Token::Or, BinOp::Or))
}

fn and_<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    binary(equality(), op(Token::And, BinOp::And))
}

fn equality<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    binary(
        comparison(),
        choice((op(Token::Eq, BinOp::Eq), op(Token::Ne, BinOp::Ne))),
    )
}

fn comparison<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    binary(
        term(),
        choice((
            op(Token::Lt, BinOp::Lt),
            op(Token::Le, BinOp::Le),
            op(Token::Gt, BinOp::Gt),
            op(Token::Ge, BinOp::Ge),
        )),
    )
}

fn term<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    binary(
        factor(),
        choice((op(Token::Plus, BinOp::Add), op(Token::Minus, BinOp::Sub))),
    )
}

fn factor<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    binary(
        unary(),
        choice((
            op(Token::Star, BinOp::Mul),
            op(Token::Slash, BinOp::Div),
            op(Token::Percent, BinOp::Rem),
        )),
    )
}

enum Suffix {
    Call(Vec<Expr>),
    Index(Expr),
}

fn postfix<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    (primary(), many(suffix())).map(|(head, suffixes): (Expr, Vec<Suffix>)| {
        suffixes.into_iter().fold(head, |acc, suffix| match suffix {
            Suffix::Call(args) => Expr::Call(Box::new(acc), args),
            Suffix::Index(index) => Expr::Index(Box::new(acc), Box::new(index)),
        })
    })
}

fn suffix<I: Stream<Token = Token>>() -> impl Parser<I, Output = Suffix> {
    choice((
        between(token(Token::LParen), token(Token::RParen), args()).map(Suffix::Call),
        between(token(Token::LBracket), token(Token::RBracket), expr()).map(Suffix::Index),
    ))
}

fn args<I: Stream<Token = Token>>() -> impl Parser<I, Output = Vec<Expr>> {
    sep_end_by(expr(), token(Token::Comma))
}

fn primary<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    choice((
        literal(),
        ident().map(Expr::Var),
        between(token(Token::LParen), token(Token::RParen), expr()),
        between(token(Token::LBracket), token(Token::RBracket), args()).map(Expr::List),
        block().map(Expr::Block),
        if_(),
        fn_(),
    ))
}

fn literal<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    satisfy_map(|tok: Token| match tok {
        Token::Number(n) => Some(Expr::Number(n)),
        Token::Str(s) => Some(Expr::Str(s)),
        Token::True => Some(Expr::Bool(true)),
        Token::False => Some(Expr::Bool(false)),
        Token::Null => Some(Expr::Null),
        _ => None,
    })
}

fn fn_<I: Stream<Token = Token>>() -> impl Parser<I, Output = Expr> {
    (
        token(Token::Fn),
        between(
            token(Token::LParen),
            token(Token::RParen),
            sep_end_by(ident(), token(Token::Comma)),
        ),
        block(),
    )
        .map(|(_, params, body): (Token, Vec<String>, Vec<Stmt>)| {
            Expr::Fn(Rc::new(FnDef { params, body }))
        })
}
