use calcdag::compiler::{CompiledExpression, OperandRef, Operation, compile};
use calcdag::errors::{CalcError, ErrorKind};
use calcdag::types::Operator;

fn op(operator: Operator, left: OperandRef, right: OperandRef) -> Operation {
    Operation {
        operator,
        left,
        right,
    }
}

use OperandRef::{Literal as L, Output as O};

fn kind_of(text: &str) -> ErrorKind {
    compile(text).expect_err(text).kind()
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let compiled = compile("2+3*4").unwrap();
    assert_eq!(
        compiled.operations,
        vec![
            op(Operator::Mul, L(3.0), L(4.0)),
            op(Operator::Add, L(2.0), O(1)),
        ]
    );
    assert_eq!(compiled.output, O(2));
}

#[test]
fn subtraction_is_left_associative() {
    let compiled = compile("10 - 4 - 3").unwrap();
    assert_eq!(
        compiled.operations,
        vec![
            op(Operator::Sub, L(10.0), L(4.0)),
            op(Operator::Sub, O(1), L(3.0)),
        ]
    );
}

#[test]
fn parentheses_override_precedence() {
    let compiled = compile("(2 + 3) * (4 - 1)").unwrap();
    assert_eq!(
        compiled.operations,
        vec![
            op(Operator::Add, L(2.0), L(3.0)),
            op(Operator::Sub, L(4.0), L(1.0)),
            op(Operator::Mul, O(1), O(2)),
        ]
    );
}

#[test]
fn references_only_point_backwards() {
    let compiled = compile("((1+2)*(3+4)-5)/(6-(7*8))").unwrap();
    for (index, operation) in compiled.operations.iter().enumerate() {
        for operand in [operation.left, operation.right] {
            if let O(k) = operand {
                assert!(k >= 1 && k <= index, "operation {} references {k}", index + 1);
            }
        }
    }
    assert_eq!(compiled.output, O(compiled.len()));
}

#[test]
fn decimals_and_whitespace() {
    let compiled = compile("  3.5 *\t.5\n").unwrap();
    assert_eq!(compiled.operations, vec![op(Operator::Mul, L(3.5), L(0.5))]);
}

#[test]
fn pure_literals_compile_to_no_operations() {
    for (text, value) in [("42", 42.0), ("(5)", 5.0), ("-3", -3.0), ("((-.25))", -0.25)] {
        let compiled = compile(text).unwrap();
        assert!(compiled.is_empty(), "{text}");
        assert_eq!(compiled.literal_value(), Some(value), "{text}");
    }
}

#[test]
fn unary_minus_on_literal_folds() {
    let compiled = compile("2 * -3").unwrap();
    assert_eq!(compiled.operations, vec![op(Operator::Mul, L(2.0), L(-3.0))]);
}

#[test]
fn unary_minus_on_group_multiplies_by_minus_one() {
    let compiled = compile("-(2 + 3)").unwrap();
    assert_eq!(
        compiled.operations,
        vec![
            op(Operator::Add, L(2.0), L(3.0)),
            op(Operator::Mul, L(-1.0), O(1)),
        ]
    );
}

#[test]
fn malformed_input_is_invalid() {
    for text in [
        "", "   ", "2 + a", "1.2.3 + 1", "(1 + 2", "1 + 2)", "()", "2++2", "2--2", "1**2",
        "2 +", "2 3", "(1)(2)", "* 3",
    ] {
        assert_eq!(kind_of(text), ErrorKind::InvalidExpression, "{text:?}");
    }
}

#[test]
fn remainder_and_unary_plus_are_unsupported() {
    assert_eq!(kind_of("7 % 2"), ErrorKind::UnsupportedExpression);
    assert_eq!(kind_of("+3"), ErrorKind::UnsupportedExpression);
    assert_eq!(kind_of("2 * +3"), ErrorKind::UnsupportedExpression);
}

#[test]
fn division_by_literal_zero_still_compiles() {
    let compiled = compile("10/0").unwrap();
    assert_eq!(compiled.operations, vec![op(Operator::Div, L(10.0), L(0.0))]);
}

#[test]
fn nesting_limit_is_enforced() {
    let deep = format!("{}1{}", "(".repeat(300), ")".repeat(300));
    assert!(matches!(compile(&deep), Err(CalcError::InvalidExpression(_))));

    let shallow = format!("{}1+1{}", "(".repeat(100), ")".repeat(100));
    let compiled: CompiledExpression = compile(&shallow).unwrap();
    assert_eq!(compiled.len(), 1);
}

#[test]
fn error_messages_point_at_the_problem() {
    let err = compile("1 + $").unwrap_err();
    assert!(err.to_string().contains("invalid character '$'"), "{err}");

    let err = compile("(1 + 2").unwrap_err();
    assert!(err.to_string().contains("mismatched parentheses"), "{err}");
}

#[test]
fn long_flat_chains_compile_left_associatively() {
    let additions = 9_000;
    let text = format!("1{}", "+1".repeat(additions));
    let compiled = compile(&text).unwrap();
    assert_eq!(compiled.len(), additions);
    assert_eq!(compiled.operations[0], op(Operator::Add, L(1.0), L(1.0)));
    for index in 1..additions {
        assert_eq!(
            compiled.operations[index],
            op(Operator::Add, O(index), L(1.0))
        );
    }
    assert_eq!(compiled.output, O(additions));

    let products = format!("2{}", "*2".repeat(9_000));
    assert_eq!(compile(&products).unwrap().len(), 9_000);
}

#[test]
fn long_mixed_precedence_chain_compiles() {
    // 1*1 + 1*1 + ... : one multiplication per term, one addition between terms
    let terms = 3_000;
    let text = vec!["1*1"; terms].join("+");
    let compiled = compile(&text).unwrap();
    assert_eq!(compiled.len(), terms + (terms - 1));
    assert_eq!(compiled.operations.last().unwrap().operator, Operator::Add);
}
