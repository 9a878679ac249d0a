// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`worker_pool`].
//!
//! - `WorkerPoolBackend` is the default implementation used by `builddag`.
//!   It wraps the worker pool from [`spawn_workers`] and just forwards node
//!   ids over an mpsc channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which nodes were dispatched and directly emits `TaskCompleted` events.
//!
//! [`worker_pool`]: super::worker_pool

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dag::NodeId;
use crate::engine::RuntimeEvent;
use crate::errors::{BuilddagError, Result};
use crate::task::{RunContext, Task};

use super::worker_pool::spawn_workers;

/// Trait abstracting how dispatched nodes are executed.
///
/// Production code uses [`WorkerPoolBackend`]; tests can provide their own
/// implementation that doesn't run real tasks.
pub trait ExecutorBackend: Send {
    /// Hand the given nodes over for execution.
    ///
    /// Every node must eventually produce exactly one
    /// `RuntimeEvent::TaskCompleted`.
    fn spawn_ready_tasks(
        &mut self,
        nodes: Vec<NodeId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Internally, this just wraps the pool started by [`spawn_workers`]. The
/// runtime calls `spawn_ready_tasks`, which forwards the node ids to the
/// workers via an mpsc channel.
#[derive(Debug)]
pub struct WorkerPoolBackend {
    tx: mpsc::Sender<NodeId>,
}

impl WorkerPoolBackend {
    /// Create a new backend with `workers` workers, wired to the given
    /// runtime event sender.
    ///
    /// This spawns the workers immediately; they exit once the backend is
    /// dropped.
    pub fn new(
        tasks: Arc<[Arc<dyn Task>]>,
        ctx: RunContext,
        workers: usize,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        let tx = spawn_workers(tasks, ctx, workers, runtime_tx);
        Self { tx }
    }
}

impl ExecutorBackend for WorkerPoolBackend {
    fn spawn_ready_tasks(
        &mut self,
        nodes: Vec<NodeId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for node in nodes {
                tx.send(node).await.map_err(|e| {
                    BuilddagError::Other(anyhow::anyhow!("worker pool is gone: {e}"))
                })?;
            }
            Ok(())
        })
    }
}
