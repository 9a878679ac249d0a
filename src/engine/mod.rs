// src/engine/mod.rs

//! Orchestration engine for builddag.
//!
//! This module ties together:
//! - the DAG scheduler
//! - the main runtime event loop that reacts to:
//!   - task completion events from the workers
//!   - abort requests (interrupts, dispatch faults)
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::fmt;

use crate::dag::NodeId;

/// Why a task counts as failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureDetail {
    /// `execute` returned `Ok(false)`.
    ReturnedFailure,
    /// `execute` returned an error or panicked.
    Fault(String),
    /// The worker went away before reporting back.
    Interrupted,
}

impl fmt::Display for FailureDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureDetail::ReturnedFailure => write!(f, "task reported failure"),
            FailureDetail::Fault(msg) => write!(f, "execution fault: {msg}"),
            FailureDetail::Interrupted => write!(f, "interrupted before completion"),
        }
    }
}

/// Outcome of one `execute` call for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(FailureDetail),
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}

/// Events flowing into the runtime from workers and signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A worker finished running a node.
    TaskCompleted { node: NodeId, outcome: TaskOutcome },
    /// Stop dispatching and drain (e.g. Ctrl-C).
    AbortRequested { reason: String },
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
