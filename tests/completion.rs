mod common;

use std::time::{Duration, Instant};

use calcdag::dag::{ResultKey, ResultState};
use calcdag::errors::CalcError;
use calcdag::storage::Storage;
use calcdag::types::{ExpressionStatus, Operator};
use calcdag_test_utils::builders::ConfigFileBuilder;
use calcdag_test_utils::drain::drain;
use calcdag_test_utils::storage::FaultyStorage;
use common::{OWNER, assert_completed, engine, init_tracing, status_of};

#[test]
fn two_step_expression_completes_with_root_value() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "2+3*4").unwrap();

    let first = engine.get_next_task().unwrap();
    assert_eq!(first.operator, Operator::Mul);
    assert_eq!((first.arg1, first.arg2), (3.0, 4.0));
    assert!(matches!(engine.get_next_task(), Err(CalcError::NoTaskAvailable)));

    engine.set_task_result(first.id, 12.0).unwrap();
    assert_eq!(status_of(&engine, id), ExpressionStatus::Processing);

    let second = engine.get_next_task().unwrap();
    assert_eq!(second.operator, Operator::Add);
    assert_eq!((second.arg1, second.arg2), (2.0, 12.0));

    engine.set_task_result(second.id, 14.0).unwrap();
    assert_completed(&engine, id, 14.0);
}

#[test]
fn root_slot_is_written_on_completion() {
    let (engine, storage) = ConfigFileBuilder::new().engine_and_storage();
    let id = engine.add_expression(OWNER, "1+2").unwrap();
    drain(&engine);

    assert_eq!(
        storage.result(&ResultKey::root(id)).unwrap(),
        Some(ResultState::Value(3.0))
    );
    let stored = storage.load_expression(id).unwrap().unwrap();
    assert_eq!(stored.status, ExpressionStatus::Completed);
    assert_eq!(stored.result, Some(3.0));
}

#[test]
fn division_by_zero_fails_the_expression() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "10/0").unwrap();

    let report = drain(&engine);
    assert_eq!(report.dispatched.len(), 1);
    assert_eq!(report.errors, 1);

    let expression = engine.get_expression(OWNER, id).unwrap();
    assert_eq!(expression.status, ExpressionStatus::Failed);
    assert_eq!(expression.result, None);
    assert_eq!(expression.failure.as_deref(), Some("Division by zero"));
}

#[test]
fn failed_task_blocks_its_dependents() {
    let engine = engine();
    // t1 = 1/0, t2 = 2+3, t3 = t1 * t2
    let id = engine.add_expression(OWNER, "(1/0) * (2+3)").unwrap();

    let report = drain(&engine);
    let dispatched: Vec<_> = report.dispatched.iter().map(|t| t.id).collect();
    assert_eq!(dispatched, vec![1, 2], "the dependent must never be dispatched");
    assert_eq!(status_of(&engine, id), ExpressionStatus::Failed);
    assert_eq!(engine.pending_task_count().unwrap(), 0);
}

#[test]
fn independent_siblings_keep_running_after_a_failure() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "(1/0) + (2*3)").unwrap();

    let failing = engine.get_next_task().unwrap();
    engine.set_task_error(failing.id, "Division by zero").unwrap();
    assert_eq!(status_of(&engine, id), ExpressionStatus::Failed);

    // the sibling is still handed out and its late result is accepted
    let sibling = engine.get_next_task().unwrap();
    assert_eq!(sibling.operator, Operator::Mul);
    engine.set_task_result(sibling.id, 6.0).unwrap();

    let expression = engine.get_expression(OWNER, id).unwrap();
    assert_eq!(expression.status, ExpressionStatus::Failed);
    assert_eq!(expression.result, None);
}

#[test]
fn sibling_results_in_any_order_converge() {
    let engine_a = engine();
    let engine_b = engine();
    let text = "(1+2)*(3+4)";
    let a = engine_a.add_expression(OWNER, text).unwrap();
    let b = engine_b.add_expression(OWNER, text).unwrap();

    let a1 = engine_a.get_next_task().unwrap();
    let a2 = engine_a.get_next_task().unwrap();
    engine_a.set_task_result(a1.id, 3.0).unwrap();
    engine_a.set_task_result(a2.id, 7.0).unwrap();

    let b1 = engine_b.get_next_task().unwrap();
    let b2 = engine_b.get_next_task().unwrap();
    engine_b.set_task_result(b2.id, 7.0).unwrap();
    engine_b.set_task_result(b1.id, 3.0).unwrap();

    drain(&engine_a);
    drain(&engine_b);
    assert_completed(&engine_a, a, 21.0);
    assert_completed(&engine_b, b, 21.0);
}

#[test]
fn duplicate_result_is_ignored() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "1+1").unwrap();
    let task = engine.get_next_task().unwrap();

    engine.set_task_result(task.id, 2.0).unwrap();
    engine.set_task_result(task.id, 99.0).unwrap();
    assert_completed(&engine, id, 2.0);
}

#[test]
fn error_after_completion_does_not_change_the_outcome() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "1+1").unwrap();
    let task = engine.get_next_task().unwrap();

    engine.set_task_result(task.id, 2.0).unwrap();
    engine.set_task_error(task.id, "too late").unwrap();
    assert_completed(&engine, id, 2.0);
}

#[test]
fn completed_status_is_immutable() {
    let engine = engine();
    let id = engine.add_expression(OWNER, "(1+1)*(2+2)").unwrap();
    drain(&engine);
    assert_completed(&engine, id, 8.0);

    for task in engine.expression_graph(id).unwrap().unwrap().tasks() {
        engine.set_task_error(*task, "ignored").unwrap();
    }
    assert_completed(&engine, id, 8.0);
}

#[test]
fn expired_lease_is_redelivered_and_late_report_counts_once() {
    init_tracing();
    let engine = ConfigFileBuilder::new().with_lease_timeout_ms(1_000).engine();
    let id = engine.add_expression(OWNER, "2*5").unwrap();

    let start = Instant::now();
    let first = engine.get_next_task_at(start).unwrap();
    assert!(matches!(
        engine.get_next_task_at(start + Duration::from_millis(500)),
        Err(CalcError::NoTaskAvailable)
    ));

    let again = engine.get_next_task_at(start + Duration::from_millis(1_500)).unwrap();
    assert_eq!(again.id, first.id);

    // the original worker reports late; the redelivered copy's report is a duplicate
    engine.set_task_result(first.id, 10.0).unwrap();
    engine.set_task_result(again.id, 10.0).unwrap();
    assert_completed(&engine, id, 10.0);
    assert_eq!(engine.pending_task_count().unwrap(), 0);
}

#[test]
fn explicit_sweep_requeues_expired_leases() {
    let engine = ConfigFileBuilder::new().with_lease_timeout_ms(100).engine();
    engine.add_expression(OWNER, "1+1").unwrap();

    let start = Instant::now();
    let task = engine.get_next_task_at(start).unwrap();
    assert_eq!(engine.pending_task_count().unwrap(), 0);

    let requeued = engine
        .sweep_expired_leases_at(start + Duration::from_millis(200))
        .unwrap();
    assert_eq!(requeued, vec![task.id]);
    assert_eq!(engine.pending_task_count().unwrap(), 1);
}

#[test]
fn storage_failure_during_submission_leaves_nothing_dispatchable() {
    init_tracing();
    let storage = FaultyStorage::new();
    storage.fail_task_saves_after(1);
    let engine = ConfigFileBuilder::new().engine_with_storage(storage.clone());

    let err = engine.add_expression(OWNER, "(1+2)*(3+4)").unwrap_err();
    assert!(matches!(err, CalcError::Internal(_)), "{err:?}");

    assert!(matches!(engine.get_next_task(), Err(CalcError::NoTaskAvailable)));
    assert!(engine.get_all_expressions(OWNER).unwrap().is_empty());
    assert_eq!(storage.inner().task_count().unwrap(), 0);
}

#[test]
fn undiscardable_submission_retires_its_id() {
    init_tracing();
    let storage = FaultyStorage::new();
    storage.fail_task_saves_after(1);
    storage.fail_discards(true);
    let engine = ConfigFileBuilder::new().engine_with_storage(storage.clone());

    let err = engine.add_expression(OWNER, "(1+2)*(3+4)").unwrap_err();
    assert!(matches!(err, CalcError::Internal(_)), "{err:?}");
    assert!(storage.inner().load_expression(1).unwrap().is_some());

    storage.allow_task_saves();
    storage.fail_discards(false);

    let id = engine.add_expression(OWNER, "3+4").unwrap();
    assert_eq!(id, 2);
    let second = engine.add_expression(OWNER, "5").unwrap();
    assert_eq!(second, 3);

    let listed: Vec<_> = engine
        .get_all_expressions(OWNER)
        .unwrap()
        .into_iter()
        .map(|expression| expression.id)
        .collect();
    assert_eq!(listed, vec![2, 3]);
    assert!(matches!(
        engine.get_expression(OWNER, 1),
        Err(CalcError::ExpressionNotFound(1))
    ));

    drain(&engine);
    assert_completed(&engine, id, 7.0);
}

#[test]
fn result_persistence_failure_writes_nothing() {
    let storage = FaultyStorage::new();
    let engine = ConfigFileBuilder::new().engine_with_storage(storage.clone());
    let id = engine.add_expression(OWNER, "1+1").unwrap();
    let task = engine.get_next_task().unwrap();

    storage.fail_result_saves(true);
    let err = engine.set_task_result(task.id, 2.0).unwrap_err();
    assert!(matches!(err, CalcError::Internal(_)));
    assert_eq!(status_of(&engine, id), ExpressionStatus::Pending);

    storage.fail_result_saves(false);
    engine.set_task_result(task.id, 2.0).unwrap();
    assert_completed(&engine, id, 2.0);
}

#[test]
fn status_persistence_failure_is_not_propagated() {
    let storage = FaultyStorage::new();
    let engine = ConfigFileBuilder::new().engine_with_storage(storage.clone());
    let id = engine.add_expression(OWNER, "1+1").unwrap();
    let task = engine.get_next_task().unwrap();

    storage.fail_updates(true);
    engine.set_task_result(task.id, 2.0).unwrap();
    assert_completed(&engine, id, 2.0);
}
