mod common;

use std::sync::Arc;
use std::time::Duration;

use calcdag::agent::{WorkerOptions, spawn_workers};
use calcdag::config::OperationDurations;
use calcdag::types::ExpressionStatus;
use calcdag_test_utils::builders::ConfigFileBuilder;
use calcdag_test_utils::{init_tracing, with_timeout};
use common::OWNER;

fn fast_options() -> WorkerOptions {
    WorkerOptions {
        poll_interval: Duration::from_millis(5),
        simulate_duration: true,
    }
}

async fn wait_terminal(engine: &calcdag::engine::Engine, id: u64) -> ExpressionStatus {
    loop {
        let status = engine.get_expression(OWNER, id).unwrap().status;
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn pool_evaluates_submitted_expressions() {
    init_tracing();
    let engine = Arc::new(ConfigFileBuilder::new().engine());
    let pool = spawn_workers(Arc::clone(&engine), 3, fast_options());
    assert_eq!(pool.len(), 3);

    let ok = engine.submit(OWNER, "(1+2)*(3+4) - 10/4").unwrap();
    let bad = engine.submit(OWNER, "1 + 2/(3-3)").unwrap();
    let literal = engine.submit(OWNER, "8").unwrap();

    assert_eq!(with_timeout(wait_terminal(&engine, ok)).await, ExpressionStatus::Completed);
    assert_eq!(with_timeout(wait_terminal(&engine, bad)).await, ExpressionStatus::Failed);

    assert_eq!(engine.get_expression(OWNER, ok).unwrap().result, Some(18.5));
    assert_eq!(engine.get_expression(OWNER, literal).unwrap().result, Some(8.0));

    let stats = with_timeout(pool.shutdown()).await;
    assert!(stats.completed >= 4, "{stats:?}");
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn simulated_durations_are_honoured() {
    init_tracing();
    let durations = OperationDurations {
        addition_ms: 30,
        ..OperationDurations::zero()
    };
    let engine = Arc::new(ConfigFileBuilder::new().with_durations(durations).engine());
    let pool = spawn_workers(Arc::clone(&engine), 1, fast_options());

    let started = tokio::time::Instant::now();
    let id = engine.submit(OWNER, "1+1+1").unwrap();
    assert_eq!(with_timeout(wait_terminal(&engine, id)).await, ExpressionStatus::Completed);
    assert!(started.elapsed() >= Duration::from_millis(60));

    with_timeout(pool.shutdown()).await;
}

#[tokio::test]
async fn idle_pool_stops_on_shutdown() {
    init_tracing();
    let engine = Arc::new(ConfigFileBuilder::new().engine());
    let pool = spawn_workers(
        Arc::clone(&engine),
        2,
        WorkerOptions {
            poll_interval: Duration::from_secs(60),
            simulate_duration: false,
        },
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    let stats = with_timeout(pool.shutdown()).await;
    assert_eq!(stats.completed, 0);
    assert_eq!(stats.failed, 0);
}
