// src/compiler/parser.rs

//! Recursive-descent parser producing an [`Ast`].
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := NUMBER | '(' expr ')'
//! ```
//!
//! The parser accepts a slightly larger language than the lowering pass can
//! handle (`%`, unary `+`), so those surface as unsupported constructs rather
//! than syntax errors.

use crate::compiler::lexer::{Token, TokenKind};
use crate::errors::{CalcError, Result};

/// Maximum nesting of parentheses / unary signs.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number(f64),
    Unary {
        op: UnaryOp,
        operand: Box<Ast>,
    },
    /// Left-associative run of same-precedence operators:
    /// `first op0 rest[0] op1 rest[1] ...`.
    ///
    /// Kept flat so the tree depth follows parenthesis and sign nesting
    /// only, not the number of operators.
    Chain {
        first: Box<Ast>,
        rest: Vec<(BinaryOp, Ast)>,
    },
    Group(Box<Ast>),
}

pub fn parse(input: &str, tokens: &[Token]) -> Result<Ast> {
    if tokens.is_empty() {
        return Err(CalcError::InvalidExpression("empty expression".to_string()));
    }

    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
        depth: 0,
    };
    let ast = parser.parse_expr()?;

    if let Some(token) = parser.peek() {
        return Err(match token.kind {
            TokenKind::RParen => CalcError::InvalidExpression(format!(
                "mismatched parentheses: unexpected ')' at offset {}",
                token.offset
            )),
            kind => CalcError::InvalidExpression(format!(
                "expected an operator before {} at offset {}",
                kind.describe(),
                token.offset
            )),
        });
    }

    Ok(ast)
}

fn chain(first: Ast, rest: Vec<(BinaryOp, Ast)>) -> Ast {
    if rest.is_empty() {
        first
    } else {
        Ast::Chain {
            first: Box::new(first),
            rest,
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(CalcError::InvalidExpression(format!(
                "expression nested deeper than {MAX_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expr(&mut self) -> Result<Ast> {
        let first = self.parse_term()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek().map(|t| t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(chain(first, rest)),
            };
            self.advance();
            rest.push((op, self.parse_term()?));
        }
    }

    fn parse_term(&mut self) -> Result<Ast> {
        let first = self.parse_unary()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek().map(|t| t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                _ => return Ok(chain(first, rest)),
            };
            self.advance();
            rest.push((op, self.parse_unary()?));
        }
    }

    fn parse_unary(&mut self) -> Result<Ast> {
        let op = match self.peek().map(|t| t.kind) {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            _ => return self.parse_primary(),
        };
        self.advance();

        self.enter()?;
        let operand = self.parse_unary();
        self.leave();

        Ok(Ast::Unary {
            op,
            operand: Box::new(operand?),
        })
    }

    fn parse_primary(&mut self) -> Result<Ast> {
        let previous = self.pos.checked_sub(1).map(|i| self.tokens[i].kind);

        let Some(token) = self.advance() else {
            return Err(CalcError::InvalidExpression(format!(
                "unexpected end of expression at offset {}",
                self.input.len()
            )));
        };

        match token.kind {
            TokenKind::Number(value) => Ok(Ast::Number(value)),
            TokenKind::LParen => {
                self.enter()?;
                let inner = self.parse_expr();
                self.leave();
                let inner = inner?;

                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(Ast::Group(Box::new(inner))),
                    Some(other) => Err(CalcError::InvalidExpression(format!(
                        "expected ')' but found {} at offset {}",
                        other.kind.describe(),
                        other.offset
                    ))),
                    None => Err(CalcError::InvalidExpression(
                        "mismatched parentheses: missing ')'".to_string(),
                    )),
                }
            }
            TokenKind::RParen if previous == Some(TokenKind::LParen) => Err(
                CalcError::InvalidExpression(format!("empty parentheses at offset {}", token.offset)),
            ),
            TokenKind::RParen => Err(CalcError::InvalidExpression(format!(
                "mismatched parentheses: unexpected ')' at offset {}",
                token.offset
            ))),
            kind if previous.is_none() => Err(CalcError::InvalidExpression(format!(
                "expression cannot start with {}",
                kind.describe()
            ))),
            kind => Err(CalcError::InvalidExpression(format!(
                "consecutive operators: unexpected {} at offset {}",
                kind.describe(),
                token.offset
            ))),
        }
    }
}
