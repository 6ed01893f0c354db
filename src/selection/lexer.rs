//! Tokenizer for the selection language, built on `nom` combinators:
//! identifiers, numbers, quoted strings, comparison operators, and
//! parentheses/commas.

use crate::error::{Error, Result};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{map, opt, recognize};
use nom::sequence::{pair, tuple};
use nom::IResult;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    String(String),
    EqEq,
    NotEq,
    Le,
    Ge,
    Lt,
    Gt,
    LParen,
    RParen,
    Comma,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

fn ident(input: &str) -> IResult<&str, TokenKind> {
    map(
        recognize(pair(
            take_while1(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_'),
        )),
        |s: &str| TokenKind::Ident(s.to_string()),
    )(input)
}

fn number(input: &str) -> IResult<&str, TokenKind> {
    map(
        recognize(tuple((opt(char('-')), digit1, opt(pair(char('.'), digit1))))),
        |s: &str| TokenKind::Number(s.parse().expect("validated by digit1/char grammar")),
    )(input)
}

fn quoted_string(input: &str) -> IResult<&str, TokenKind> {
    map(
        tuple((char('"'), take_while(|c: char| c != '"'), char('"'))),
        |(_, body, _): (char, &str, char)| TokenKind::String(body.to_string()),
    )(input)
}

fn operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        map(tag("=="), |_| TokenKind::EqEq),
        map(tag("!="), |_| TokenKind::NotEq),
        map(tag("<="), |_| TokenKind::Le),
        map(tag(">="), |_| TokenKind::Ge),
        map(tag("<"), |_| TokenKind::Lt),
        map(tag(">"), |_| TokenKind::Gt),
        map(tag("("), |_| TokenKind::LParen),
        map(tag(")"), |_| TokenKind::RParen),
        map(tag(","), |_| TokenKind::Comma),
    ))(input)
}

fn one_token(input: &str) -> IResult<&str, TokenKind> {
    alt((quoted_string, number, ident, operator))(input)
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = input;
    let mut consumed = 0usize;

    loop {
        let ws_result: IResult<&str, &str> = multispace0(rest);
        let (after_ws, _) = ws_result.expect("multispace0 never fails");
        consumed += rest.len() - after_ws.len();
        rest = after_ws;

        if rest.is_empty() {
            break;
        }

        let offset = consumed;
        let result: IResult<&str, TokenKind> = one_token(rest);
        match result {
            Ok((remaining, kind)) => {
                consumed += rest.len() - remaining.len();
                rest = remaining;
                tokens.push(Token { kind, offset });
            }
            Err(_) => {
                return Err(Error::selection(offset, format!("unexpected input: {:?}", &rest[..rest.len().min(16)])));
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Eof, offset: input.len() });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_comparison_and_keywords() {
        let tokens = tokenize("index >= 3 and name == CA").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("index".into()),
                TokenKind::Ge,
                TokenKind::Number(3.0),
                TokenKind::Ident("and".into()),
                TokenKind::Ident("name".into()),
                TokenKind::EqEq,
                TokenKind::Ident("CA".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_quoted_strings_and_parens() {
        let tokens = tokenize("is_bonded(i, j) and resname == \"ALA\"").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("is_bonded".into()),
                TokenKind::LParen,
                TokenKind::Ident("i".into()),
                TokenKind::Comma,
                TokenKind::Ident("j".into()),
                TokenKind::RParen,
                TokenKind::Ident("and".into()),
                TokenKind::Ident("resname".into()),
                TokenKind::EqEq,
                TokenKind::String("ALA".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unexpected_character() {
        assert!(tokenize("name == @").is_err());
    }
}
