// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending node ids to the worker pool
//! - turning interrupts into abort events
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes.

use crate::dag::Scheduler;
use crate::engine::RuntimeEvent;
use crate::engine::event_handlers::{
    CoreStep, dispatch_or_finish, handle_abort, handle_task_completion,
};

/// Pure core runtime state.
///
/// This owns the DAG scheduler. It has **no** channels, no Tokio types, and
/// does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Initial dispatch of every node that is ready up front.
    pub fn start(&mut self) -> CoreStep {
        dispatch_or_finish(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { node, outcome } => {
                handle_task_completion(&mut self.scheduler, node, outcome)
            }
            RuntimeEvent::AbortRequested { reason } => handle_abort(&mut self.scheduler, reason),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Expose whether the run is over (for tests).
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_finished()
    }

    pub fn into_scheduler(self) -> Scheduler {
        self.scheduler
    }
}
