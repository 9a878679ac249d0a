// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use crate::dag::graph::NodeId;

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the DAG and make
/// assertions about what changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStep {
    /// Nodes promoted to `Ready` by this step.
    pub newly_ready: Vec<NodeId>,
    /// Node that failed in this step, if any.
    pub newly_failed: Option<NodeId>,
    /// Transitive dependents of the failed node; they will never run.
    pub newly_blocked: Vec<NodeId>,
    /// Whether the run is finished after this step.
    pub run_just_finished: bool,
}
