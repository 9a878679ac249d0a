// src/dag/scheduler.rs

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::dag::graph::{DagGraph, NodeId};
use crate::dag::node::{NodeState, TaskNode};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::engine::{FailureDetail, TaskOutcome};

/// Why the scheduler stopped handing out work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    /// A task failed and `keep_going` is off.
    TaskFailed(NodeId),
    /// Run-level fault or external interruption.
    Aborted(String),
}

/// Why a node never ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotAttemptedReason {
    /// A (transitive) predecessor failed.
    UpstreamFailure { failed: NodeId },
    /// Dispatching stopped before the node got a worker.
    RunHalted,
}

/// Scheduler holds the node arena plus the per-run readiness state.
///
/// It is a pure, synchronous state machine responsible for:
/// - releasing a node exactly when all its predecessors are done
/// - bounding the number of `Running` nodes by `parallelism`
/// - stopping dispatch on the first failure (unless `keep_going`)
/// - knowing when the run is over
///
/// It never executes anything; the engine feeds it completions.
#[derive(Debug)]
pub struct Scheduler {
    nodes: Vec<TaskNode>,
    /// FIFO of `Ready` nodes waiting for a worker.
    ready: VecDeque<NodeId>,
    running: usize,
    parallelism: usize,
    keep_going: bool,
    halted: Option<HaltReason>,
    failures: Vec<(NodeId, FailureDetail)>,
}

impl Scheduler {
    /// Build the per-run state for `graph`.
    ///
    /// `skip[id] == true` marks a node `Skipped` (decided by the freshness
    /// filter). Skipped nodes count as done for their dependents.
    pub fn new(graph: &DagGraph, skip: &[bool], parallelism: usize, keep_going: bool) -> Self {
        let mut nodes: Vec<TaskNode> = (0..graph.len())
            .map(|id| TaskNode::from_graph(graph, id))
            .collect();
        let mut ready = VecDeque::new();

        for id in 0..nodes.len() {
            if skip.get(id).copied().unwrap_or(false) {
                nodes[id].state = NodeState::Skipped;
            }
        }

        for id in 0..nodes.len() {
            if nodes[id].state == NodeState::Skipped {
                continue;
            }
            let pending = nodes[id]
                .deps
                .iter()
                .filter(|&&dep| nodes[dep].state != NodeState::Skipped)
                .count();
            nodes[id].pending = pending;
        }

        // Seed the queue in topological order so that, at parallelism 1,
        // execution follows the graph's order.
        let seeds: Vec<NodeId> = graph
            .topological_order()
            .iter()
            .copied()
            .filter(|&id| nodes[id].state == NodeState::Blocked && nodes[id].pending == 0)
            .collect();
        {
            let mut manager = StateManager::new(&mut nodes, &mut ready);
            for id in seeds {
                manager.mark_ready(id);
            }
        }

        let skipped = nodes.iter().filter(|n| n.state == NodeState::Skipped).count();
        info!(
            tasks = nodes.len(),
            skipped,
            ready = ready.len(),
            parallelism = parallelism.max(1),
            "scheduler initialised"
        );

        Self {
            nodes,
            ready,
            running: 0,
            parallelism: parallelism.max(1),
            keep_going,
            halted: None,
            failures: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn state_of(&self, id: NodeId) -> Option<NodeState> {
        self.nodes.get(id).map(|n| n.state)
    }

    pub fn node(&self, id: NodeId) -> Option<&TaskNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    /// Nodes currently in `state`, by id.
    pub fn nodes_in(&self, state: NodeState) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.state == state)
            .map(|n| n.id)
            .collect()
    }

    pub fn running_count(&self) -> usize {
        self.running
    }

    pub fn halt_reason(&self) -> Option<&HaltReason> {
        self.halted.as_ref()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Failed nodes with their detail, in completion order.
    pub fn failures(&self) -> &[(NodeId, FailureDetail)] {
        &self.failures
    }

    /// Whether every predecessor of `id` is `Succeeded` or `Skipped`.
    pub fn deps_satisfied(&self, id: NodeId) -> Option<bool> {
        if id >= self.nodes.len() {
            return None;
        }
        Some(ReadOnlyStateManager::new(&self.nodes).deps_satisfied(id))
    }

    /// The run is over once nothing is running and nothing more will be
    /// dispatched.
    pub fn is_finished(&self) -> bool {
        self.running == 0 && (self.halted.is_some() || self.ready.is_empty())
    }

    /// Move as many `Ready` nodes to `Running` as free slots allow.
    pub fn next_dispatch(&mut self) -> Vec<NodeId> {
        let mut dispatched = Vec::new();
        if self.halted.is_some() {
            return dispatched;
        }

        while self.running < self.parallelism {
            let Some(id) = self.ready.pop_front() else {
                break;
            };
            let node = &mut self.nodes[id];
            node.state = NodeState::Running;
            self.running += 1;
            info!(task = %node.label, node = id, "dispatching task");
            dispatched.push(id);
        }

        dispatched
    }

    /// Record the outcome of a `Running` node (production API).
    pub fn handle_completion(&mut self, id: NodeId, outcome: TaskOutcome) -> Vec<NodeId> {
        self.step_completion(id, outcome).newly_ready
    }

    /// Manual-step variant of `handle_completion` that returns a rich
    /// [`SchedulerStep`].
    pub fn step_completion(&mut self, id: NodeId, outcome: TaskOutcome) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        match self.nodes.get(id).map(|n| n.state) {
            Some(NodeState::Running) => {}
            Some(state) => {
                warn!(node = id, ?state, "completion for a node that is not Running; ignoring");
                step.run_just_finished = self.is_finished();
                return step;
            }
            None => {
                warn!(node = id, "completion for unknown node; ignoring");
                step.run_just_finished = self.is_finished();
                return step;
            }
        }

        self.running -= 1;

        match outcome {
            TaskOutcome::Success => {
                self.nodes[id].state = NodeState::Succeeded;
                debug!(task = %self.nodes[id].label, node = id, "task succeeded");
                let mut manager = StateManager::new(&mut self.nodes, &mut self.ready);
                step.newly_ready = manager.release_dependents(id);
            }
            TaskOutcome::Failed(detail) => {
                self.nodes[id].state = NodeState::Failed;
                warn!(
                    task = %self.nodes[id].label,
                    node = id,
                    %detail,
                    "task failed; its dependents will not run"
                );
                let manager = StateManager::new(&mut self.nodes, &mut self.ready);
                step.newly_blocked = manager.transitive_dependents(id);
                step.newly_failed = Some(id);
                self.failures.push((id, detail));

                if !self.keep_going && self.halted.is_none() {
                    info!(
                        running = self.running,
                        "no new tasks will be started; waiting for running tasks"
                    );
                    self.halted = Some(HaltReason::TaskFailed(id));
                }
            }
        }

        step.run_just_finished = self.is_finished();
        if step.run_just_finished {
            info!("scheduler: nothing left to run; run finished");
        }
        step
    }

    /// Stop dispatching because of a run-level fault. Running nodes are
    /// left to finish.
    pub fn abort(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.halted.is_none() {
            warn!(%reason, running = self.running, "run aborted; draining running tasks");
            self.halted = Some(HaltReason::Aborted(reason));
        } else {
            debug!(%reason, "abort requested on an already halted run");
        }
    }

    /// Nodes that never ran, with the reason.
    ///
    /// Meaningful once [`Scheduler::is_finished`] holds.
    pub fn not_attempted(&self) -> Vec<(NodeId, NotAttemptedReason)> {
        let ro = ReadOnlyStateManager::new(&self.nodes);
        self.nodes
            .iter()
            .filter(|n| matches!(n.state, NodeState::Blocked | NodeState::Ready))
            .map(|n| {
                let reason = match ro.failed_ancestor(n.id) {
                    Some(failed) => NotAttemptedReason::UpstreamFailure { failed },
                    None => NotAttemptedReason::RunHalted,
                };
                (n.id, reason)
            })
            .collect()
    }
}
