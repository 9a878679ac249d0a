// src/dag/node.rs

//! Scheduler-internal task nodes and their run state.

use crate::dag::graph::{DagGraph, NodeId};

/// Run state of a node.
///
/// Transitions are monotonic: `Blocked -> Ready -> Running ->
/// Succeeded | Failed`, or `Blocked -> Skipped` via the freshness filter.
/// A node whose predecessor failed stays `Blocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Waiting for at least one predecessor.
    Blocked,
    /// Every predecessor finished; queued for a worker.
    Ready,
    /// Handed to a worker.
    Running,
    /// Outputs were up to date; never executed.
    Skipped,
    Succeeded,
    Failed,
}

impl NodeState {
    /// Whether dependents may count this node as done.
    pub fn satisfies_dependents(self) -> bool {
        matches!(self, NodeState::Succeeded | NodeState::Skipped)
    }
}

/// Arena entry owned by the scheduler.
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub id: NodeId,
    pub label: String,
    /// Predecessors that have not finished yet.
    pub pending: usize,
    pub state: NodeState,
    pub deps: Vec<NodeId>,
    pub dependents: Vec<NodeId>,
}

impl TaskNode {
    pub fn from_graph(graph: &DagGraph, id: NodeId) -> Self {
        let deps = graph.dependencies_of(id).to_vec();
        Self {
            id,
            label: graph.label_of(id).to_string(),
            pending: deps.len(),
            state: NodeState::Blocked,
            deps,
            dependents: graph.dependents_of(id).to_vec(),
        }
    }
}
