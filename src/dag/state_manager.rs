// src/dag/state_manager.rs

//! State transitions over the node arena.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::dag::graph::NodeId;
use crate::dag::node::{NodeState, TaskNode};

/// Applies transitions to the scheduler's nodes and ready queue.
pub struct StateManager<'a> {
    nodes: &'a mut [TaskNode],
    ready: &'a mut VecDeque<NodeId>,
}

impl<'a> StateManager<'a> {
    pub fn new(nodes: &'a mut [TaskNode], ready: &'a mut VecDeque<NodeId>) -> Self {
        Self { nodes, ready }
    }

    /// `Blocked -> Ready`, enqueueing the node.
    pub fn mark_ready(&mut self, id: NodeId) {
        let node = &mut self.nodes[id];
        debug_assert_eq!(node.state, NodeState::Blocked);
        node.state = NodeState::Ready;
        self.ready.push_back(id);
        debug!(task = %node.label, node = id, "dependencies satisfied; marking Ready");
    }

    /// Count `finished` as done for each of its dependents and promote those
    /// that have nothing left to wait for. Returns the promoted nodes.
    pub fn release_dependents(&mut self, finished: NodeId) -> Vec<NodeId> {
        let dependents = self.nodes[finished].dependents.clone();
        let mut promoted = Vec::new();

        for dep in dependents {
            let node = &mut self.nodes[dep];
            if node.state != NodeState::Blocked {
                warn!(
                    task = %node.label,
                    state = ?node.state,
                    "dependent is not Blocked while a predecessor finished; ignoring"
                );
                continue;
            }
            node.pending = node.pending.saturating_sub(1);
            if node.pending == 0 {
                self.mark_ready(dep);
                promoted.push(dep);
            }
        }

        promoted
    }

    /// Every node reachable from `failed` through dependent edges.
    ///
    /// They stay `Blocked`; this only names them.
    pub fn transitive_dependents(&self, failed: NodeId) -> Vec<NodeId> {
        let mut stack: Vec<NodeId> = self.nodes[failed].dependents.clone();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut out = Vec::new();

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.nodes[id].dependents.iter().copied());
        }

        out.sort_unstable();
        out
    }
}

/// Read-only queries over the arena.
pub struct ReadOnlyStateManager<'a> {
    nodes: &'a [TaskNode],
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(nodes: &'a [TaskNode]) -> Self {
        Self { nodes }
    }

    /// A failed ancestor of `id`, if any (the lowest id wins for
    /// determinism).
    pub fn failed_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.nodes[id].deps.clone();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut found: Option<NodeId> = None;

        while let Some(cur) = stack.pop() {
            if !visited.insert(cur) {
                continue;
            }
            if self.nodes[cur].state == NodeState::Failed {
                found = Some(found.map_or(cur, |f| f.min(cur)));
                continue;
            }
            stack.extend(self.nodes[cur].deps.iter().copied());
        }

        found
    }

    /// Whether every predecessor of `id` satisfies it.
    pub fn deps_satisfied(&self, id: NodeId) -> bool {
        self.nodes[id]
            .deps
            .iter()
            .all(|&dep| self.nodes[dep].state.satisfies_dependents())
    }
}
