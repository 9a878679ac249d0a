// src/report.rs

//! Result aggregation for one run.
//!
//! [`RunReport`] is built once the scheduler is finished (or once a
//! structural error stopped the run before anything executed). It records
//! the final state of every node, what failed, what never ran and why, and
//! the artifacts the run leaves behind.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::dag::{HaltReason, NodeId, NodeState, Scheduler};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::engine::FailureDetail;
use crate::errors::StructuralError;
use crate::task::Task;

pub use crate::dag::NotAttemptedReason;

/// Run-level verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(f, "success"),
            Outcome::Failure => write!(f, "failure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub node: NodeId,
    pub label: String,
    pub detail: FailureDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAttempted {
    pub node: NodeId,
    pub label: String,
    pub reason: NotAttemptedReason,
}

/// Aggregated result of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: Outcome,
    /// Task labels indexed by node id.
    pub labels: Vec<String>,
    /// Final state per node id.
    pub states: Vec<NodeState>,
    pub failures: Vec<TaskFailure>,
    pub not_attempted: Vec<NotAttempted>,
    pub structural_errors: Vec<StructuralError>,
    /// Nodes whose `execute` was called, in id order.
    pub executed: Vec<NodeId>,
    pub skipped: Vec<NodeId>,
    /// Outputs of every succeeded or skipped node.
    pub artifacts: BTreeSet<PathBuf>,
    /// Set when the run was stopped by an abort request.
    pub aborted: Option<String>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Report for a run stopped by structural errors: nothing executed.
    pub fn structural<T>(tasks: &[T], errors: Vec<StructuralError>, elapsed: Duration) -> Self
    where
        T: AsRef<dyn Task>,
    {
        let labels: Vec<String> = tasks.iter().map(|t| t.as_ref().label().to_string()).collect();
        let not_attempted = labels
            .iter()
            .enumerate()
            .map(|(node, label)| NotAttempted {
                node,
                label: label.clone(),
                reason: NotAttemptedReason::RunHalted,
            })
            .collect();

        Self {
            outcome: Outcome::Failure,
            states: vec![NodeState::Blocked; labels.len()],
            labels,
            failures: Vec::new(),
            not_attempted,
            structural_errors: errors,
            executed: Vec::new(),
            skipped: Vec::new(),
            artifacts: BTreeSet::new(),
            aborted: None,
            elapsed,
        }
    }

    /// Report for a run the scheduler drove to the end.
    pub fn from_scheduler<T>(scheduler: &Scheduler, tasks: &[T], elapsed: Duration) -> Self
    where
        T: AsRef<dyn Task>,
    {
        let labels: Vec<String> = scheduler.nodes().iter().map(|n| n.label.clone()).collect();
        let states: Vec<NodeState> = scheduler.nodes().iter().map(|n| n.state).collect();

        let failures: Vec<TaskFailure> = scheduler
            .failures()
            .iter()
            .map(|(node, detail)| TaskFailure {
                node: *node,
                label: labels[*node].clone(),
                detail: detail.clone(),
            })
            .collect();

        let not_attempted = scheduler
            .not_attempted()
            .into_iter()
            .map(|(node, reason)| NotAttempted {
                node,
                label: labels[node].clone(),
                reason,
            })
            .collect();

        let executed = ids_where(&states, |s| {
            matches!(s, NodeState::Succeeded | NodeState::Failed)
        });
        let skipped = ids_where(&states, |s| s == NodeState::Skipped);

        let artifacts: BTreeSet<PathBuf> = states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.satisfies_dependents())
            .flat_map(|(id, _)| tasks[id].as_ref().outputs().iter().cloned())
            .collect();

        let aborted = match scheduler.halt_reason() {
            Some(HaltReason::Aborted(reason)) => Some(reason.clone()),
            _ => None,
        };

        let outcome = if failures.is_empty() && aborted.is_none() {
            Outcome::Success
        } else {
            Outcome::Failure
        };

        Self {
            outcome,
            labels,
            states,
            failures,
            not_attempted,
            structural_errors: Vec::new(),
            executed,
            skipped,
            artifacts,
            aborted,
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }

    /// Final state of the first node labelled `label`.
    pub fn state_of(&self, label: &str) -> Option<NodeState> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|id| self.states[id])
    }

    pub fn executed_labels(&self) -> Vec<&str> {
        self.executed.iter().map(|&id| self.labels[id].as_str()).collect()
    }

    pub fn skipped_labels(&self) -> Vec<&str> {
        self.skipped.iter().map(|&id| self.labels[id].as_str()).collect()
    }

    /// Write the run's error diagnostics into `sink` and log a summary.
    ///
    /// One entry per structural error, one per failed task, one listing
    /// every node that was not attempted, and one for an abort.
    pub fn emit(&self, sink: &dyn DiagnosticSink) {
        for err in &self.structural_errors {
            sink.report(Diagnostic::error(err.to_string()));
        }

        for failure in &self.failures {
            sink.report(Diagnostic::error(failure.detail.to_string()).for_task(&failure.label));
        }

        if !self.not_attempted.is_empty() {
            let entries: Vec<String> = self
                .not_attempted
                .iter()
                .map(|n| match n.reason {
                    NotAttemptedReason::UpstreamFailure { failed } => format!(
                        "{} (upstream failure in '{}')",
                        n.label, self.labels[failed]
                    ),
                    NotAttemptedReason::RunHalted => format!("{} (run halted)", n.label),
                })
                .collect();
            sink.report(Diagnostic::error(format!(
                "{} task(s) not attempted: {}",
                entries.len(),
                entries.join(", ")
            )));
        }

        if let Some(ref reason) = self.aborted {
            sink.report(Diagnostic::error(format!("run aborted: {reason}")));
        }

        match self.outcome {
            Outcome::Success => info!(
                executed = self.executed.len(),
                skipped = self.skipped.len(),
                elapsed_ms = self.elapsed.as_millis() as u64,
                "build succeeded"
            ),
            Outcome::Failure => warn!(
                executed = self.executed.len(),
                skipped = self.skipped.len(),
                failed = self.failures.len(),
                not_attempted = self.not_attempted.len(),
                structural = self.structural_errors.len(),
                elapsed_ms = self.elapsed.as_millis() as u64,
                "build failed"
            ),
        }
    }
}

fn ids_where(states: &[NodeState], pred: impl Fn(NodeState) -> bool) -> Vec<NodeId> {
    states
        .iter()
        .enumerate()
        .filter(|&(_, &s)| pred(s))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::DagGraph;
    use crate::diagnostics::MemorySink;
    use crate::engine::TaskOutcome;
    use crate::task::{RunContext, TaskFuture};

    #[derive(Debug)]
    struct Stub {
        label: String,
        inputs: Vec<PathBuf>,
        outputs: Vec<PathBuf>,
    }

    impl Task for Stub {
        fn inputs(&self) -> &[PathBuf] {
            &self.inputs
        }
        fn outputs(&self) -> &[PathBuf] {
            &self.outputs
        }
        fn label(&self) -> &str {
            &self.label
        }
        fn execute<'a>(&'a self, _ctx: &'a RunContext) -> TaskFuture<'a> {
            Box::pin(async { Ok(true) })
        }
    }

    fn chain() -> Vec<Box<dyn Task>> {
        (1..=4)
            .map(|i| {
                Box::new(Stub {
                    label: format!("T{i}"),
                    inputs: vec![PathBuf::from(format!("f{}", i - 1))],
                    outputs: vec![PathBuf::from(format!("f{i}"))],
                }) as Box<dyn Task>
            })
            .collect()
    }

    #[test]
    fn failure_in_the_middle_is_reported() {
        let tasks = chain();
        let graph = DagGraph::build(&tasks).unwrap();
        let mut s = Scheduler::new(&graph, &[false; 4], 1, false);
        s.next_dispatch();
        s.handle_completion(0, TaskOutcome::Success);
        s.next_dispatch();
        s.handle_completion(1, TaskOutcome::Failed(FailureDetail::ReturnedFailure));

        let report = RunReport::from_scheduler(&s, &tasks, Duration::ZERO);
        assert_eq!(report.outcome, Outcome::Failure);
        assert_eq!(report.state_of("T1"), Some(NodeState::Succeeded));
        assert_eq!(report.state_of("T2"), Some(NodeState::Failed));
        assert_eq!(report.state_of("T3"), Some(NodeState::Blocked));
        assert_eq!(report.executed_labels(), vec!["T1", "T2"]);
        assert_eq!(report.artifacts, BTreeSet::from([PathBuf::from("f1")]));

        let sink = MemorySink::new();
        report.emit(&sink);
        let errors = sink.errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].task.as_deref(), Some("T2"));
        assert_eq!(
            errors[1].message,
            "2 task(s) not attempted: T3 (upstream failure in 'T2'), T4 (upstream failure in 'T2')"
        );
    }

    #[test]
    fn skipped_nodes_contribute_artifacts() {
        let tasks = chain();
        let graph = DagGraph::build(&tasks).unwrap();
        let s = Scheduler::new(&graph, &[true; 4], 1, false);

        let report = RunReport::from_scheduler(&s, &tasks, Duration::ZERO);
        assert!(report.is_success());
        assert!(report.executed.is_empty());
        assert_eq!(report.skipped_labels(), vec!["T1", "T2", "T3", "T4"]);
        assert_eq!(report.artifacts.len(), 4);

        let sink = MemorySink::new();
        report.emit(&sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn structural_report_runs_nothing() {
        let tasks = chain();
        let err = StructuralError::DependencyCycle {
            tasks: vec!["T1".into(), "T2".into()],
        };
        let report = RunReport::structural(&tasks, vec![err.clone()], Duration::ZERO);

        assert_eq!(report.outcome, Outcome::Failure);
        assert!(report.executed.is_empty());
        assert_eq!(report.not_attempted.len(), 4);

        let sink = MemorySink::new();
        report.emit(&sink);
        assert_eq!(sink.errors()[0].message, err.to_string());
    }
}
