// src/compiler/lexer.rs

//! Tokenizer for infix arithmetic.

use crate::errors::{CalcError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => format!("number {n}"),
            TokenKind::Plus => "'+'".to_string(),
            TokenKind::Minus => "'-'".to_string(),
            TokenKind::Star => "'*'".to_string(),
            TokenKind::Slash => "'/'".to_string(),
            TokenKind::Percent => "'%'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
        }
    }
}

/// A token plus the byte offset it started at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // `++` and `--` are increment/decrement in most C-like grammars and
        // never a valid pair of signs here.
        if (b == b'+' || b == b'-') && bytes.get(i + 1) == Some(&b) {
            return Err(CalcError::InvalidExpression(format!(
                "consecutive operators '{0}{0}' at offset {1}",
                b as char, i
            )));
        }

        let start = i;
        let kind = match b {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'%' => TokenKind::Percent,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            _ if b.is_ascii_digit() || b == b'.' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let literal = &input[start..i];
                let value: f64 = literal.parse().map_err(|_| {
                    CalcError::InvalidExpression(format!(
                        "invalid number '{literal}' at offset {start}"
                    ))
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    offset: start,
                });
                continue;
            }
            _ => {
                let ch = input[i..].chars().next().unwrap_or('?');
                return Err(CalcError::InvalidExpression(format!(
                    "invalid character '{ch}' at offset {i}"
                )));
            }
        };

        i += 1;
        tokens.push(Token {
            kind,
            offset: start,
        });
    }

    Ok(tokens)
}
