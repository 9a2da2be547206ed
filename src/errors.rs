// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Every public engine operation returns either a value or exactly one
//! [`CalcError`]. Transports that need to map failures onto their own status
//! codes should match on [`CalcError::kind`] rather than on the message.

use std::fmt;

use thiserror::Error;

use crate::types::{ExpressionId, OwnerId, TaskId};

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Expression not found: {0}")]
    ExpressionNotFound(ExpressionId),

    #[error("Expression {expression} is not owned by user {owner}")]
    Unauthorized {
        expression: ExpressionId,
        owner: OwnerId,
    },

    #[error("No task available")]
    NoTaskAvailable,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Fieldless discriminant of [`CalcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidExpression,
    UnsupportedExpression,
    DivisionByZero,
    TaskNotFound,
    ExpressionNotFound,
    Unauthorized,
    NoTaskAvailable,
    Config,
    Internal,
}

impl CalcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalcError::InvalidExpression(_) => ErrorKind::InvalidExpression,
            CalcError::UnsupportedExpression(_) => ErrorKind::UnsupportedExpression,
            CalcError::DivisionByZero => ErrorKind::DivisionByZero,
            CalcError::TaskNotFound(_) => ErrorKind::TaskNotFound,
            CalcError::ExpressionNotFound(_) => ErrorKind::ExpressionNotFound,
            CalcError::Unauthorized { .. } => ErrorKind::Unauthorized,
            CalcError::NoTaskAvailable => ErrorKind::NoTaskAvailable,
            CalcError::ConfigError(_) | CalcError::TomlError(_) => ErrorKind::Config,
            CalcError::IoError(_) | CalcError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// `true` for "nothing to do right now" signals that callers should
    /// simply retry later.
    pub fn is_transient(&self) -> bool {
        matches!(self, CalcError::NoTaskAvailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidExpression => "invalid_expression",
            ErrorKind::UnsupportedExpression => "unsupported_expression",
            ErrorKind::DivisionByZero => "division_by_zero",
            ErrorKind::TaskNotFound => "task_not_found",
            ErrorKind::ExpressionNotFound => "expression_not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NoTaskAvailable => "no_task_available",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CalcError>;
