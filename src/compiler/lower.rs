// src/compiler/lower.rs

//! Post-order lowering of an [`Ast`] into binary [`Operation`]s.

use crate::compiler::parser::{Ast, BinaryOp, UnaryOp};
use crate::errors::{CalcError, Result};
use crate::types::Operator;

/// Operand of a compiled operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OperandRef {
    Literal(f64),
    /// Output of the operation with this 1-based emission index.
    Output(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operation {
    pub operator: Operator,
    pub left: OperandRef,
    pub right: OperandRef,
}

/// Result of compiling one expression.
///
/// `operations` is in emission order: operation `k` (1-based) only refers to
/// outputs of operations `1..k`. `output` is the value of the whole
/// expression: a literal when nothing needs computing, otherwise the output
/// of the last operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    pub operations: Vec<Operation>,
    pub output: OperandRef,
}

impl CompiledExpression {
    /// The expression's value if it needs no operations at all.
    pub fn literal_value(&self) -> Option<f64> {
        match self.output {
            OperandRef::Literal(value) => Some(value),
            OperandRef::Output(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

pub fn lower(ast: &Ast) -> Result<CompiledExpression> {
    let mut operations = Vec::new();
    let output = lower_node(ast, &mut operations)?;
    Ok(CompiledExpression { operations, output })
}

fn lower_node(node: &Ast, operations: &mut Vec<Operation>) -> Result<OperandRef> {
    match node {
        Ast::Number(value) => Ok(OperandRef::Literal(*value)),
        Ast::Group(inner) => lower_node(inner, operations),
        Ast::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match lower_node(operand, operations)? {
            OperandRef::Literal(value) => Ok(OperandRef::Literal(-value)),
            reference => Ok(emit(
                operations,
                Operation {
                    operator: Operator::Mul,
                    left: OperandRef::Literal(-1.0),
                    right: reference,
                },
            )),
        },
        Ast::Unary {
            op: UnaryOp::Plus, ..
        } => Err(CalcError::UnsupportedExpression(
            "unary '+' is not supported".to_string(),
        )),
        Ast::Chain { first, rest } => {
            let mut left = lower_node(first, operations)?;
            for (op, rhs) in rest {
                let operator = lower_operator(*op)?;
                let right = lower_node(rhs, operations)?;
                left = emit(
                    operations,
                    Operation {
                        operator,
                        left,
                        right,
                    },
                );
            }
            Ok(left)
        }
    }
}

fn lower_operator(op: BinaryOp) -> Result<Operator> {
    match op {
        BinaryOp::Add => Ok(Operator::Add),
        BinaryOp::Sub => Ok(Operator::Sub),
        BinaryOp::Mul => Ok(Operator::Mul),
        BinaryOp::Div => Ok(Operator::Div),
        BinaryOp::Rem => Err(CalcError::UnsupportedExpression(
            "operator '%' is not supported".to_string(),
        )),
    }
}

fn emit(operations: &mut Vec<Operation>, operation: Operation) -> OperandRef {
    operations.push(operation);
    OperandRef::Output(operations.len())
}
