// src/agent/evaluate.rs

use crate::errors::{CalcError, Result};
use crate::types::Operator;

/// Apply one binary operator to concrete operands.
pub fn evaluate(operator: Operator, arg1: f64, arg2: f64) -> Result<f64> {
    match operator {
        Operator::Add => Ok(arg1 + arg2),
        Operator::Sub => Ok(arg1 - arg2),
        Operator::Mul => Ok(arg1 * arg2),
        Operator::Div => {
            if arg2 == 0.0 {
                Err(CalcError::DivisionByZero)
            } else {
                Ok(arg1 / arg2)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_each_operator() {
        assert_eq!(evaluate(Operator::Add, 2.0, 3.0).unwrap(), 5.0);
        assert_eq!(evaluate(Operator::Sub, 2.0, 3.0).unwrap(), -1.0);
        assert_eq!(evaluate(Operator::Mul, 2.0, 3.0).unwrap(), 6.0);
        assert_eq!(evaluate(Operator::Div, 3.0, 2.0).unwrap(), 1.5);
    }

    #[test]
    fn zero_divisor_is_an_error() {
        assert!(matches!(
            evaluate(Operator::Div, 1.0, 0.0),
            Err(CalcError::DivisionByZero)
        ));
        assert!(matches!(
            evaluate(Operator::Div, 1.0, -0.0),
            Err(CalcError::DivisionByZero)
        ));
    }
}
