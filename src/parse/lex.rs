extern crate unindent;

use super::Token;
use crate::error::{Error, Result};

use combine::parser::char::{digit, hex_digit, string};
use combine::parser::repeat::skip_until;
use combine::{attempt, choice, count_min_max, many, many1, not_followed_by, one_of, optional};
use combine::{satisfy, satisfy_map, skip_many, skip_many1, token};
use combine::{EasyParser, ParseError, Parser, Stream};
use unindent::unindent;

pub const END_OF_INPUT: &str = "Unexpected end of input";
pub const INVALID_TOKEN: &str = "Invalid or unexpected token";

const LONG_QUOTE: &str = "\"\"\"";

/// Splits a chunk into tokens.
///
/// Running out of input inside a `"""` string or a `/* */` comment means the
/// user is still typing, so it is reported as an end of input. Anything else
/// the lexer can't read is an invalid token, including a plain string cut
/// short by a newline.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    loop {
        rest = match trivia().easy_parse(rest) {
            Ok(((), rem)) => rem,
            Err(e) if e.is_unexpected_end_of_input() => return Err(Error::syntax(END_OF_INPUT)),
            Err(_) => return Err(Error::syntax(INVALID_TOKEN)),
        };

        if rest.is_empty() {
            return Ok(tokens);
        }

        match lexeme().easy_parse(rest) {
            Ok((tok, rem)) => {
                tokens.push(tok);
                rest = rem;
            }
            Err(e) if e.is_unexpected_end_of_input() && rest.starts_with(LONG_QUOTE) => {
                return Err(Error::syntax(END_OF_INPUT))
            }
            Err(_) => return Err(Error::syntax(INVALID_TOKEN)),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn trivia<I: Stream<Token = char>>() -> impl Parser<I, Output = ()> {
    skip_many(choice((
        skip_many1(satisfy(|c: char| c.is_whitespace())),
        attempt(string("//")).with(skip_many(satisfy(|c| c != '\n'))),
        attempt(string("/*"))
            .with(skip_until(attempt(string("*/"))))
            .with(string("*/"))
            .map(|_| ()),
    )))
}

fn lexeme<I: Stream<Token = char>>() -> impl Parser<I, Output = Token> {
    choice((
        number(),
        attempt(string(LONG_QUOTE)).with(long_str()).map(Token::Str),
        lit_str().map(Token::Str),
        word(),
        punct(),
    ))
}

fn number<I: Stream<Token = char>>() -> impl Parser<I, Output = Token> {
    (
        many1(digit()),
        optional(attempt(token('.').with(many1(digit())))),
    )
        .skip(not_followed_by(satisfy(is_ident_char).map(|_| "identifier")))
        .map(|(int, frac): (String, Option<String>)| {
            let text = match frac {
                Some(frac) => format!("{}.{}", int, frac),
                None => int,
            };
            Token::Number(text.parse().unwrap_or(f64::NAN))
        })
}

fn word<I: Stream<Token = char>>() -> impl Parser<I, Output = Token> {
    (satisfy(is_ident_start), many(satisfy(is_ident_char))).map(|(first, rest): (char, String)| {
        let mut word = String::with_capacity(rest.len() + 1);
        word.push(first);
        word.push_str(&rest);
        Token::keyword(&word).unwrap_or(Token::Ident(word))
    })
}

fn punct<I: Stream<Token = char>>() -> impl Parser<I, Output = Token> {
    choice((
        attempt(string("==")).map(|_| Token::Eq),
        attempt(string("!=")).map(|_| Token::Ne),
        attempt(string("<=")).map(|_| Token::Le),
        attempt(string(">=")).map(|_| Token::Ge),
        attempt(string("&&")).map(|_| Token::And),
        attempt(string("||")).map(|_| Token::Or),
        satisfy_map(Token::punct),
    ))
}

fn lit_str<I: Stream<Token = char>>() -> impl Parser<I, Output = String> {
    token('"')
        .with(many(
            satisfy(|c: char| c != '"' && c != '\\' && c != '\n').or(escape()),
        ))
        .skip(token('"'))
}

fn long_str<I: Stream<Token = char>>() -> impl Parser<I, Output = String> {
    many(not_followed_by(string(LONG_QUOTE)).with(satisfy(|c: char| c != '\\').or(escape())))
        .skip(string(LONG_QUOTE))
        .map(|s: String| unindent(&s))
}

fn escape<I: Stream<Token = char>>() -> impl Parser<I, Output = char> {
    token('\\').with(choice((
        one_of("nrt0\\\"'".chars()).map(|seq| match seq {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            c => c,
        }),
        token('x')
            .with(count_min_max(2, 2, hex_digit()))
            .map(|s: String| hex_char(&s)),
        token('u')
            .with(token('{'))
            .with(count_min_max(1, 6, hex_digit()))
            .skip(token('}'))
            .map(|s: String| hex_char(&s)),
    )))
}

fn hex_char(digits: &str) -> char {
    u32::from_str_radix(digits, 16)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tokens() {
        assert_eq!(
            tokenize("let x = 1.5 // trailing\n x<=y && !z").unwrap(),
            vec![
                Token::Let,
                Token::Ident("x".into()),
                Token::Assign,
                Token::Number(1.5),
                Token::Ident("x".into()),
                Token::Le,
                Token::Ident("y".into()),
                Token::And,
                Token::Bang,
                Token::Ident("z".into()),
            ]
        );
    }

    #[test]
    fn keywords_need_a_word_boundary() {
        assert_eq!(
            tokenize("iffy if").unwrap(),
            vec![Token::Ident("iffy".into()), Token::If]
        );
    }

    #[test]
    fn strings() {
        assert_eq!(
            tokenize(r#""a\tb\x41\u{1F600}""#).unwrap(),
            vec![Token::Str("a\tbA\u{1F600}".into())]
        );
        assert_eq!(tokenize(r#""""#).unwrap(), vec![Token::Str(String::new())]);
    }

    #[test]
    fn long_strings_are_unindented() {
        let src = "\"\"\"\n    one\n      two\"\"\"";
        assert_eq!(tokenize(src).unwrap(), vec![Token::Str("one\n  two".into())]);
    }

    #[test]
    fn open_long_string_wants_more() {
        assert_eq!(
            tokenize("\"\"\"abc\n"),
            Err(Error::syntax(END_OF_INPUT))
        );
        assert_eq!(tokenize("1 /* open"), Err(Error::syntax(END_OF_INPUT)));
    }

    #[test]
    fn broken_tokens() {
        assert_eq!(tokenize("\"abc"), Err(Error::syntax(INVALID_TOKEN)));
        assert_eq!(tokenize("\"abc\n\""), Err(Error::syntax(INVALID_TOKEN)));
        assert_eq!(tokenize("1 @ 2"), Err(Error::syntax(INVALID_TOKEN)));
        assert_eq!(tokenize("12abc"), Err(Error::syntax(INVALID_TOKEN)));
        assert_eq!(tokenize("a & b"), Err(Error::syntax(INVALID_TOKEN)));
    }
}
