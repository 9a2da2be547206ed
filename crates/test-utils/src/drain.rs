use calcdag::agent::evaluate;
use calcdag::dag::TaskAssignment;
use calcdag::engine::Engine;
use calcdag::errors::CalcError;

/// What a synchronous drain did.
#[derive(Debug, Default, Clone)]
pub struct DrainReport {
    /// Every task handed out, in dispatch order.
    pub dispatched: Vec<TaskAssignment>,
    pub results: usize,
    pub errors: usize,
}

/// Dispatch, evaluate and report until the engine has no ready task left.
///
/// This is what a single worker does, minus the sleeping and polling.
pub fn drain(engine: &Engine) -> DrainReport {
    let mut report = DrainReport::default();

    loop {
        let task = match engine.get_next_task() {
            Ok(task) => task,
            Err(CalcError::NoTaskAvailable) => return report,
            Err(err) => panic!("unexpected dispatch error: {err}"),
        };
        report.dispatched.push(task);

        match evaluate(task.operator, task.arg1, task.arg2) {
            Ok(value) => {
                engine
                    .set_task_result(task.id, value)
                    .expect("reporting a result for a dispatched task");
                report.results += 1;
            }
            Err(err) => {
                engine
                    .set_task_error(task.id, &err.to_string())
                    .expect("reporting an error for a dispatched task");
                report.errors += 1;
            }
        }
    }
}
