// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::{NodeId, NodeState, Scheduler};
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, FailureDetail, RuntimeEvent, TaskOutcome};

/// Drives the DAG scheduler in response to `RuntimeEvent`s,
/// and delegates actual task execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics. This struct handles async IO: reading events from
/// channels and dispatching nodes to the executor.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Dispatches the initially ready nodes.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the
    ///   core runtime.
    /// - Executes commands returned by the core until it asks to finish.
    ///
    /// Returns the scheduler in its final state.
    pub async fn run(mut self) -> Scheduler {
        info!(
            tasks = self.core.scheduler().len(),
            parallelism = self.core.scheduler().parallelism(),
            "builddag runtime started"
        );

        let step = self.core.start();
        let mut keep_running = self.execute_commands(step.commands).await && step.keep_running;

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    warn!("runtime event channel closed with tasks in flight");
                    self.interrupt_running("event channel closed");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            // Feed the event into the pure core and get commands back.
            let step = self.core.step(event);
            keep_running = self.execute_commands(step.commands).await && step.keep_running;
        }

        info!("runtime exiting");
        self.core.into_scheduler()
    }

    /// Execute commands from the core. Returns `false` once the core asked to
    /// finish.
    async fn execute_commands(&mut self, commands: Vec<CoreCommand>) -> bool {
        let mut pending: VecDeque<CoreCommand> = commands.into();
        let mut keep_running = true;

        while let Some(command) = pending.pop_front() {
            match command {
                CoreCommand::DispatchTasks(nodes) => {
                    if let Err(err) = self.spawn_ready(nodes.clone()).await {
                        error!(error = %err, ?nodes, "failed to dispatch tasks; aborting run");
                        keep_running = self.fail_undispatched(&nodes, err.to_string());
                        if !keep_running {
                            pending.clear();
                        }
                    }
                }
                CoreCommand::Finish => {
                    debug!("core issued Finish command");
                    keep_running = false;
                }
            }
        }

        keep_running
    }

    async fn spawn_ready(&mut self, nodes: Vec<NodeId>) -> crate::errors::Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        debug!(?nodes, "spawning ready tasks");
        self.executor.spawn_ready_tasks(nodes).await
    }

    /// Nodes of a batch that never reached a worker count as faulted; the run
    /// halts. Returns whether the loop should keep running.
    fn fail_undispatched(&mut self, nodes: &[NodeId], message: String) -> bool {
        let mut step = self.core.step(RuntimeEvent::AbortRequested {
            reason: format!("dispatch failed: {message}"),
        });
        for &node in nodes {
            if self.core.scheduler().state_of(node) == Some(NodeState::Running) {
                step = self.core.step(RuntimeEvent::TaskCompleted {
                    node,
                    outcome: TaskOutcome::Failed(FailureDetail::Fault(message.clone())),
                });
            }
        }
        step.keep_running
    }

    /// Mark every `Running` node as interrupted; used when no completion can
    /// ever arrive.
    fn interrupt_running(&mut self, reason: &str) {
        self.core.step(RuntimeEvent::AbortRequested {
            reason: reason.to_string(),
        });
        for node in self.core.scheduler().nodes_in(NodeState::Running) {
            self.core.step(RuntimeEvent::TaskCompleted {
                node,
                outcome: TaskOutcome::Failed(FailureDetail::Interrupted),
            });
        }
    }
}
