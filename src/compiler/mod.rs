// src/compiler/mod.rs

//! Expression compiler: infix text to an ordered list of binary operations.
//!
//! - [`lexer`] turns text into tokens.
//! - [`parser`] builds an AST honouring precedence, associativity and
//!   parentheses.
//! - [`lower`] walks the AST post-order and emits one [`Operation`] per
//!   binary node, so every operand reference points at an earlier operation.
//!
//! Compilation is all-or-nothing: any error discards the partial output.

pub mod lexer;
pub mod lower;
pub mod parser;

pub use lower::{CompiledExpression, OperandRef, Operation};
pub use parser::{Ast, BinaryOp, UnaryOp};

use tracing::debug;

use crate::errors::{CalcError, Result};

/// Upper bound on tokens accepted in a single expression.
pub const MAX_TOKENS: usize = 20_000;

/// Compile `text` into an ordered operation list.
pub fn compile(text: &str) -> Result<CompiledExpression> {
    let tokens = lexer::tokenize(text)?;
    if tokens.len() > MAX_TOKENS {
        return Err(CalcError::InvalidExpression(format!(
            "expression has {} tokens (limit {MAX_TOKENS})",
            tokens.len()
        )));
    }

    let ast = parser::parse(text, &tokens)?;
    let compiled = lower::lower(&ast)?;

    debug!(
        tokens = tokens.len(),
        operations = compiled.len(),
        "compiled expression"
    );

    Ok(compiled)
}
