mod common;

use calcdag::errors::{CalcError, ErrorKind};
use calcdag::storage::Storage;
use calcdag::types::{Expression, ExpressionStatus};
use calcdag_test_utils::builders::ConfigFileBuilder;
use common::{OTHER_OWNER, OWNER, assert_completed, engine, status_of};

#[test]
fn add_expression_registers_pending_expression_with_root() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "2+3*4").unwrap();

    let expression = engine.get_expression(OWNER, id).unwrap();
    assert_eq!(expression.status, ExpressionStatus::Pending);
    assert_eq!(expression.text, "2+3*4");
    assert_eq!(expression.root_task_id, Some(2));
    assert_eq!(expression.result, None);
    assert_eq!(engine.pending_task_count().unwrap(), 2);

    let graph = engine.expression_graph(id).unwrap().unwrap();
    assert_eq!(graph.root_task_id(), 2);
}

#[test]
fn pure_literal_expression_completes_without_tasks() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "(-5)").unwrap();

    assert_completed(&engine, id, -5.0);
    assert_eq!(engine.pending_task_count().unwrap(), 0);
    assert!(engine.expression_graph(id).unwrap().is_none());
}

#[test]
fn simple_expression_is_completed_immediately() {
    let engine = engine();
    let id = engine.add_simple_expression(OWNER, "42").unwrap();

    assert_completed(&engine, id, 42.0);
    assert_eq!(engine.pending_task_count().unwrap(), 0);
    assert!(matches!(engine.get_next_task(), Err(CalcError::NoTaskAvailable)));
}

#[test]
fn simple_expression_rejects_non_literals() {
    let engine = engine();
    for text in ["", "1+1", "abc", "1.", ".5", "--1"] {
        let err = engine.add_simple_expression(OWNER, text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExpression, "{text:?}");
    }
}

#[test]
fn submit_routes_literals_and_formulas() {
    let engine = engine();

    let literal = engine.submit(OWNER, " -12.5 ").unwrap();
    assert_completed(&engine, literal, -12.5);
    assert!(engine.expression_graph(literal).unwrap().is_none());

    let formula = engine.submit(OWNER, "1 + 2").unwrap();
    assert_eq!(status_of(&engine, formula), ExpressionStatus::Pending);
    assert_eq!(engine.pending_task_count().unwrap(), 1);

    let err = engine.submit(OWNER, "   ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidExpression);
}

#[test]
fn compile_errors_leave_no_trace() {
    let engine = engine();
    assert_eq!(
        engine.add_expression(OWNER, "2 +* 3").unwrap_err().kind(),
        ErrorKind::InvalidExpression
    );
    assert_eq!(
        engine.add_expression(OWNER, "5 % 2").unwrap_err().kind(),
        ErrorKind::UnsupportedExpression
    );

    assert!(engine.get_all_expressions(OWNER).unwrap().is_empty());
    assert_eq!(engine.pending_task_count().unwrap(), 0);

    // ids are only consumed by accepted expressions
    assert_eq!(engine.add_expression(OWNER, "1+1").unwrap(), 1);
}

#[test]
fn expressions_are_private_to_their_owner() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "1+1").unwrap();

    match engine.get_expression(OTHER_OWNER, id) {
        Err(CalcError::Unauthorized { expression, owner }) => {
            assert_eq!(expression, id);
            assert_eq!(owner, OTHER_OWNER);
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }

    assert!(matches!(
        engine.get_expression(OWNER, 999),
        Err(CalcError::ExpressionNotFound(999))
    ));
}

#[test]
fn listing_is_filtered_by_owner_and_ordered_by_id() {
    let engine = engine();
    let a = engine.add_expression(OWNER, "1+1").unwrap();
    let _b = engine.add_expression(OTHER_OWNER, "2+2").unwrap();
    let c = engine.add_simple_expression(OWNER, "3").unwrap();

    let ids: Vec<_> = engine
        .get_all_expressions(OWNER)
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![a, c]);
}

#[test]
fn get_expression_falls_back_to_storage() {
    let (engine, storage) = ConfigFileBuilder::new().engine_and_storage();

    let mut archived = Expression::new(500, OWNER, "6*7");
    archived.status = ExpressionStatus::Completed;
    archived.result = Some(42.0);
    storage.save_expression(&archived).unwrap();

    let loaded = engine.get_expression(OWNER, 500).unwrap();
    assert_eq!(loaded.result, Some(42.0));
    assert!(matches!(
        engine.get_expression(OTHER_OWNER, 500),
        Err(CalcError::Unauthorized { .. })
    ));

    let listed = engine.get_all_expressions(OWNER).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 500);
}

#[test]
fn accepted_expressions_and_tasks_are_persisted() {
    let (engine, storage) = ConfigFileBuilder::new().engine_and_storage();
    let id = engine.add_expression(OWNER, "(1+2)*3").unwrap();

    assert!(storage.load_expression(id).unwrap().is_some());
    assert_eq!(storage.task_count().unwrap(), 2);
}

#[test]
fn unknown_tasks_are_reported() {
    let engine = engine();
    assert!(matches!(engine.set_task_result(77, 1.0), Err(CalcError::TaskNotFound(77))));
    assert!(matches!(
        engine.set_task_error(78, "nope"),
        Err(CalcError::TaskNotFound(78))
    ));
}

#[test]
fn no_task_available_is_transient() {
    let engine = engine();
    let err = engine.get_next_task().unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.kind().to_string(), "no_task_available");
}
