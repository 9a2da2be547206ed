#![allow(dead_code)]

use calcdag::engine::Engine;
use calcdag::types::{ExpressionStatus, OwnerId};
use calcdag_test_utils::builders::ConfigFileBuilder;

pub use calcdag_test_utils::init_tracing;

pub const OWNER: OwnerId = 7;
pub const OTHER_OWNER: OwnerId = 8;

/// Engine with zero durations and leases disabled.
pub fn engine() -> Engine {
    init_tracing();
    ConfigFileBuilder::new().engine()
}

pub fn status_of(engine: &Engine, id: u64) -> ExpressionStatus {
    engine
        .get_expression(OWNER, id)
        .expect("expression should exist")
        .status
}

/// Assert that `id` completed with `expected`.
pub fn assert_completed(engine: &Engine, id: u64, expected: f64) {
    let expression = engine.get_expression(OWNER, id).expect("expression should exist");
    assert_eq!(
        expression.status,
        ExpressionStatus::Completed,
        "expression {id} ({}) did not complete: {:?}",
        expression.text,
        expression.failure
    );
    assert_eq!(expression.result, Some(expected), "expression {id} ({})", expression.text);
}
