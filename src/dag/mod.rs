// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`graph`] derives the dependency graph from input/output paths.
//! - [`node`] holds the per-run node states.
//! - [`scheduler`] contains the per-run state machine that decides
//!   which tasks are ready to run, and when dependents can be scheduled.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod node;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;

pub use graph::{DagGraph, NodeId};
pub use node::{NodeState, TaskNode};
pub use scheduler::{HaltReason, NotAttemptedReason, Scheduler};
pub use scheduler_step::SchedulerStep;
