// src/exec/worker_pool.rs

//! Fixed-size pool of workers running task bodies.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use crate::dag::NodeId;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::task::{RunContext, Task};

/// Spawn `workers` worker loops sharing one job queue.
///
/// The returned `mpsc::Sender<NodeId>` is what `WorkerPoolBackend` uses to
/// hand out work. Each worker takes one node at a time, runs it to
/// completion and reports a `TaskCompleted` event, so at most `workers`
/// task bodies execute concurrently. Workers exit when the sender is
/// dropped.
pub fn spawn_workers(
    tasks: Arc<[Arc<dyn Task>]>,
    ctx: RunContext,
    workers: usize,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> mpsc::Sender<NodeId> {
    let workers = workers.max(1);
    let (tx, rx) = mpsc::channel::<NodeId>(workers);
    let rx = Arc::new(Mutex::new(rx));

    for worker in 0..workers {
        let rx = Arc::clone(&rx);
        let tasks = Arc::clone(&tasks);
        let ctx = ctx.clone();
        let runtime_tx = runtime_tx.clone();

        tokio::spawn(async move {
            debug!(worker, "worker started");

            loop {
                // Hold the lock only while waiting for the next job.
                let next = rx.lock().await.recv().await;
                let Some(node) = next else {
                    break;
                };

                let Some(task) = tasks.get(node).cloned() else {
                    debug!(worker, node, "dispatched node out of range; ignoring");
                    continue;
                };
                run_task(node, task, ctx.clone(), &runtime_tx).await;
            }

            debug!(worker, "worker finished (channel closed)");
        });
    }

    info!(workers, "worker pool started");
    tx
}
