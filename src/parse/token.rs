use crate::error::Error;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Let,
    Fn,
    If,
    Else,
    While,
    Break,
    Continue,
    Return,
    Throw,
    True,
    False,
    Null,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl Token {
    pub fn keyword<T: AsRef<str>>(word: T) -> Option<Self> {
        Some(match word.as_ref() {
            "let" => Self::Let,
            "fn" => Self::Fn,
            "if" => Self::If,
            "else" => Self::Else,
            "while" => Self::While,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "return" => Self::Return,
            "throw" => Self::Throw,
            "true" => Self::True,
            "false" => Self::False,
            "null" => Self::Null,
            _ => return None,
        })
    }

    pub fn punct(c: char) -> Option<Self> {
        Some(match c {
            '(' => Self::LParen,
            ')' => Self::RParen,
            '{' => Self::LBrace,
            '}' => Self::RBrace,
            '[' => Self::LBracket,
            ']' => Self::RBracket,
            ',' => Self::Comma,
            ';' => Self::Semi,
            '=' => Self::Assign,
            '+' => Self::Plus,
            '-' => Self::Minus,
            '*' => Self::Star,
            '/' => Self::Slash,
            '%' => Self::Percent,
            '!' => Self::Bang,
            '<' => Self::Lt,
            '>' => Self::Gt,
            _ => return None,
        })
    }

    /// The syntax error reported when this token shows up where the grammar
    /// can't use it.
    pub fn unexpected(&self) -> Error {
        match self {
            Self::Number(_) => Error::syntax("Unexpected number"),
            Self::Str(_) => Error::syntax("Unexpected string"),
            Self::Ident(name) => Error::syntax(format!("Unexpected identifier '{}'", name)),
            tok => Error::syntax(format!("Unexpected token '{}'", tok)),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Number(n) => return write!(f, "{}", n),
            Self::Str(s) => return write!(f, "{:?}", s),
            Self::Ident(name) => name.as_str(),
            Self::Let => "let",
            Self::Fn => "fn",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Return => "return",
            Self::Throw => "throw",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Comma => ",",
            Self::Semi => ";",
            Self::Assign => "=",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Bang => "!",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        };
        f.write_str(s)
    }
}
