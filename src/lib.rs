// src/lib.rs

pub mod agent;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod storage;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::agent::{WorkerOptions, spawn_workers};
use crate::cli::CliArgs;
use crate::compiler::compile;
use crate::config::loader::load_or_default;
use crate::dag::Scheduler;
use crate::engine::Engine;
use crate::types::{Expression, ExpressionId, OwnerId};

/// Interval at which `run` checks whether all submitted expressions settled.
const SETTLE_POLL: Duration = Duration::from_millis(20);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the engine with in-memory storage
/// - the worker pool
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)?;

    if args.dry_run {
        print_dry_run(&args.expressions);
        return Ok(());
    }

    let workers = args.workers.unwrap_or(cfg.agent.computing_power);
    if workers == 0 {
        bail!("--workers must be >= 1");
    }

    let options = WorkerOptions {
        poll_interval: cfg.agent.poll_interval(),
        simulate_duration: !args.no_delay,
    };
    let engine = Arc::new(Engine::in_memory(cfg));

    let mut submitted = Vec::new();
    for text in &args.expressions {
        match engine.submit(args.owner, text) {
            Ok(id) => submitted.push(id),
            Err(err) => {
                warn!(expression = %text, error = %err, "expression rejected");
                println!("-  rejected  {text:?}: {err}");
            }
        }
    }

    if submitted.is_empty() {
        bail!("no expression was accepted");
    }

    info!(workers, expressions = submitted.len(), "starting worker pool");
    let pool = spawn_workers(Arc::clone(&engine), workers, options);

    tokio::select! {
        settled = wait_until_settled(&engine, args.owner, &submitted) => settled?,
        signal = tokio::signal::ctrl_c() => {
            if let Err(err) = signal {
                warn!(error = %err, "failed to listen for Ctrl+C");
            }
            info!("interrupted; stopping workers");
        }
    }

    for id in &submitted {
        print_expression(&engine.get_expression(args.owner, *id)?);
    }

    let stats = pool.shutdown().await;
    debug!(completed = stats.completed, failed = stats.failed, "worker pool stopped");

    Ok(())
}

async fn wait_until_settled(engine: &Engine, owner: OwnerId, ids: &[ExpressionId]) -> Result<()> {
    loop {
        let mut settled = true;
        for id in ids {
            if !engine.get_expression(owner, *id)?.is_terminal() {
                settled = false;
                break;
            }
        }
        if settled {
            return Ok(());
        }
        tokio::time::sleep(SETTLE_POLL).await;
    }
}

fn print_expression(expression: &Expression) {
    let outcome = match (expression.result, expression.failure.as_deref()) {
        (Some(value), _) => value.to_string(),
        (None, Some(reason)) => reason.to_string(),
        (None, None) => "-".to_string(),
    };
    println!("{}  {}  {}", expression.id, expression.status, outcome);
}

/// Compile each expression and print the tasks it would produce.
fn print_dry_run(expressions: &[String]) {
    println!("calcdag dry-run");

    let mut scheduler = Scheduler::new();
    for (index, text) in expressions.iter().enumerate() {
        let expression_id = index as ExpressionId + 1;
        println!();
        println!("expression {expression_id}: {text}");

        let compiled = match compile(text) {
            Ok(compiled) => compiled,
            Err(err) => {
                println!("  error: {err}");
                continue;
            }
        };

        if let Some(value) = compiled.literal_value() {
            println!("  literal: {value}");
            continue;
        }

        let built = match scheduler.builder_for(expression_id).build(&compiled) {
            Ok(built) => built,
            Err(err) => {
                println!("  error: {err}");
                continue;
            }
        };

        for task in &built.tasks {
            let deps = built.graph.dependencies_of(task.id);
            let marker = if task.id == built.root_task_id() { "  (root)" } else { "" };
            println!(
                "  task {}: {:?} {} {:?}{}",
                task.id, task.arg1, task.operator, task.arg2, marker
            );
            if !deps.is_empty() {
                println!("      after: {deps:?}");
            }
        }
    }

    debug!("dry-run complete (no evaluation)");
}
