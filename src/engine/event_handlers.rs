// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::debug;

use crate::dag::{NodeId, Scheduler};
use crate::engine::TaskOutcome;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand these nodes to the workers.
    DispatchTasks(Vec<NodeId>),
    /// Nothing is running and nothing will be dispatched; stop the loop.
    Finish,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Dispatch whatever fits, or finish if the scheduler is done.
pub fn dispatch_or_finish(scheduler: &mut Scheduler) -> CoreStep {
    let mut commands = Vec::new();

    let batch = scheduler.next_dispatch();
    if !batch.is_empty() {
        commands.push(CoreCommand::DispatchTasks(batch));
    }

    let keep_running = !scheduler.is_finished();
    if !keep_running {
        commands.push(CoreCommand::Finish);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    node: NodeId,
    outcome: TaskOutcome,
) -> CoreStep {
    let step = scheduler.step_completion(node, outcome);
    debug!(
        node,
        newly_ready = ?step.newly_ready,
        newly_failed = ?step.newly_failed,
        "completion applied"
    );
    dispatch_or_finish(scheduler)
}

/// Handle an abort request: halt dispatching, keep draining.
pub fn handle_abort(scheduler: &mut Scheduler, reason: String) -> CoreStep {
    scheduler.abort(reason);
    dispatch_or_finish(scheduler)
}
