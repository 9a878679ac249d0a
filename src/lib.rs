// src/lib.rs

//! Build-orchestration core.
//!
//! A caller hands over a flat collection of [`Task`]s (preprocess, compile,
//! link, generate...) and a [`RunContext`]. builddag derives the dependency
//! graph from the declared input and output paths, skips tasks whose outputs
//! are up to date, runs the rest on a bounded worker pool in dependency order
//! and returns a [`RunReport`].

pub mod cli;
pub mod config;
pub mod dag;
pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod freshness;
pub mod fs;
pub mod logging;
pub mod report;
pub mod task;
pub mod types;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{DagGraph, Scheduler};
use crate::diagnostics::Diagnostic;
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent};
use crate::errors::StructuralError;
use crate::exec::WorkerPoolBackend;
use crate::freshness::FreshnessFilter;
use crate::types::MissingInputPolicy;

pub use crate::config::ExecConfig;
pub use crate::diagnostics::{DiagnosticSink, MemorySink, TracingSink};
pub use crate::errors::{BuilddagError, Result};
pub use crate::report::{Outcome, RunReport};
pub use crate::task::{CommandTask, FileProviderTask, RunContext, Task, TaskFuture};

/// Run every task in `tasks` to completion.
///
/// Never returns early on a task failure: in-flight tasks are drained and the
/// outcome is reported in the returned [`RunReport`]. Error diagnostics are
/// also written to the context's sink.
pub async fn run(tasks: Vec<Box<dyn Task>>, ctx: RunContext) -> RunReport {
    run_with_abort(tasks, ctx, std::future::pending::<()>()).await
}

/// Like [`run`], but stops dispatching new tasks once `abort` resolves.
///
/// Tasks already running are allowed to finish; the run then reports
/// [`Outcome::Failure`].
pub async fn run_with_abort<F>(mut tasks: Vec<Box<dyn Task>>, ctx: RunContext, abort: F) -> RunReport
where
    F: Future<Output = ()> + Send + 'static,
{
    let started = Instant::now();
    info!(
        tasks = tasks.len(),
        parallelism = ctx.config().effective_parallelism(),
        force = ctx.config().force,
        keep_going = ctx.config().keep_going,
        "starting build"
    );

    // Every task is prepared exactly once, before the graph exists.
    let mut errors = Vec::new();
    for task in tasks.iter_mut() {
        if let Err(err) = task.prepare(&ctx) {
            errors.push(StructuralError::PrepareFailed {
                task: task.label().to_string(),
                message: format!("{err:#}"),
            });
        }
    }
    if !errors.is_empty() {
        return finish(RunReport::structural(&tasks, errors, started.elapsed()), &ctx);
    }

    let tasks: Vec<Arc<dyn Task>> = tasks.into_iter().map(Arc::from).collect();

    let graph = match DagGraph::build(&tasks) {
        Ok(graph) => graph,
        Err(errors) => {
            return finish(RunReport::structural(&tasks, errors, started.elapsed()), &ctx);
        }
    };

    if let Err(errors) = check_missing_inputs(&graph, &ctx) {
        return finish(RunReport::structural(&tasks, errors, started.elapsed()), &ctx);
    }

    let skip: Vec<bool> = FreshnessFilter::new(ctx.fs(), ctx.config().force)
        .evaluate(&graph, &tasks)
        .iter()
        .map(|d| d.is_skip())
        .collect();
    debug!(
        skipped = skip.iter().filter(|&&s| s).count(),
        "freshness evaluated"
    );

    let parallelism = ctx.config().effective_parallelism();
    let scheduler = Scheduler::new(&graph, &skip, parallelism, ctx.config().keep_going);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let tasks: Arc<[Arc<dyn Task>]> = Arc::from(tasks);
    let executor = WorkerPoolBackend::new(Arc::clone(&tasks), ctx.clone(), parallelism, rt_tx.clone());

    // External abort → stop dispatching.
    let abort_handle = {
        let tx = rt_tx;
        tokio::spawn(async move {
            abort.await;
            let _ = tx
                .send(RuntimeEvent::AbortRequested {
                    reason: "interrupted".to_string(),
                })
                .await;
        })
    };

    let core = CoreRuntime::new(scheduler);
    let scheduler = Runtime::new(core, rt_rx, executor).run().await;
    abort_handle.abort();

    finish(
        RunReport::from_scheduler(&scheduler, &tasks, started.elapsed()),
        &ctx,
    )
}

/// Blocking wrapper around [`run`] on a multi-thread runtime sized to the
/// configured parallelism.
pub fn run_blocking(tasks: Vec<Box<dyn Task>>, ctx: RunContext) -> Result<RunReport> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(ctx.config().effective_parallelism())
        .enable_all()
        .build()?;
    Ok(runtime.block_on(run(tasks, ctx)))
}

/// Resolves on the first Ctrl-C; pass it to [`run_with_abort`].
///
/// If the signal handler cannot be installed this never resolves.
pub async fn interrupt_on_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received; no new tasks will be started");
}

/// Apply the missing-input policy to inputs nobody produces.
fn check_missing_inputs(
    graph: &DagGraph,
    ctx: &RunContext,
) -> std::result::Result<(), Vec<StructuralError>> {
    let missing = graph.missing_external_inputs(ctx.fs());
    if missing.is_empty() {
        return Ok(());
    }

    match ctx.config().missing_inputs {
        MissingInputPolicy::Warn => {
            for (node, path) in missing {
                let label = graph.label_of(node);
                warn!(task = %label, path = ?path, "input does not exist and no task produces it");
                ctx.report(
                    Diagnostic::warning(format!(
                        "input file {path:?} does not exist and no task produces it"
                    ))
                    .for_task(label),
                );
            }
            Ok(())
        }
        MissingInputPolicy::Error => Err(missing
            .into_iter()
            .map(|(node, path)| StructuralError::MissingInput {
                path,
                task: graph.label_of(node).to_string(),
            })
            .collect()),
    }
}

fn finish(report: RunReport, ctx: &RunContext) -> RunReport {
    report.emit(ctx.sink());
    report
}
