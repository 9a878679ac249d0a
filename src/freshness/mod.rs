// src/freshness/mod.rs

//! Freshness filter: decides which tasks can be skipped.
//!
//! Make-style rule: a task is up to date when all its outputs exist and the
//! oldest output is not older than the newest input. The decision is taken
//! in topological order and is transitive: if any predecessor has to run,
//! this task has to run too, since its inputs are about to be regenerated.
//!
//! Every decision is logged at `debug` with the reason.

pub mod stamps;

use std::path::PathBuf;
use std::time::SystemTime;

use tracing::debug;

use crate::dag::graph::{DagGraph, NodeId};
use crate::fs::FileSystem;
use crate::task::Task;

pub use stamps::StampCache;

/// Why a task has to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReason {
    /// The run was configured with `force`.
    ForcedRun,
    /// The task asked for unconditional execution.
    ForceExecute,
    /// The task declares no outputs, so there is nothing to compare.
    NoOutputs,
    /// A predecessor is going to run.
    UpstreamRuns(NodeId),
    OutputMissing(PathBuf),
    InputMissing(PathBuf),
    /// This input is newer than the oldest output.
    InputNewer(PathBuf),
}

/// Per-task verdict of the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Skip,
    Run(RunReason),
}

impl Decision {
    pub fn is_skip(&self) -> bool {
        matches!(self, Decision::Skip)
    }
}

/// Evaluates [`Decision`]s for a whole graph.
#[derive(Debug)]
pub struct FreshnessFilter<'a> {
    fs: &'a dyn FileSystem,
    force: bool,
    stamps: StampCache,
}

impl<'a> FreshnessFilter<'a> {
    pub fn new(fs: &'a dyn FileSystem, force: bool) -> Self {
        Self {
            fs,
            force,
            stamps: StampCache::new(),
        }
    }

    /// Decide for every task of `graph`. The result is indexed by
    /// [`NodeId`]; `tasks` must be the slice the graph was built from.
    pub fn evaluate<T>(&mut self, graph: &DagGraph, tasks: &[T]) -> Vec<Decision>
    where
        T: AsRef<dyn Task>,
    {
        let mut decisions: Vec<Option<Decision>> = vec![None; graph.len()];

        for &id in graph.topological_order() {
            let task = tasks[id].as_ref();
            let decision = self.decide(graph, id, task, &decisions);

            match decision {
                Decision::Skip => {
                    debug!(target: "builddag::freshness", task = %task.label(), "up to date; skipping");
                }
                Decision::Run(ref reason) => {
                    debug!(target: "builddag::freshness", task = %task.label(), ?reason, "must run");
                }
            }
            decisions[id] = Some(decision);
        }

        decisions
            .into_iter()
            .map(|d| d.unwrap_or(Decision::Run(RunReason::ForcedRun)))
            .collect()
    }

    fn decide(
        &mut self,
        graph: &DagGraph,
        id: NodeId,
        task: &dyn Task,
        decided: &[Option<Decision>],
    ) -> Decision {
        if self.force {
            return Decision::Run(RunReason::ForcedRun);
        }
        if task.force_execute() {
            return Decision::Run(RunReason::ForceExecute);
        }
        if task.outputs().is_empty() {
            return Decision::Run(RunReason::NoOutputs);
        }

        // Topological order guarantees predecessors are decided.
        for &dep in graph.dependencies_of(id) {
            if !matches!(decided[dep], Some(Decision::Skip)) {
                return Decision::Run(RunReason::UpstreamRuns(dep));
            }
        }

        let mut oldest_output: Option<SystemTime> = None;
        for output in task.outputs() {
            match self.stamps.get_or_query(self.fs, output) {
                Some(ts) => {
                    oldest_output = Some(oldest_output.map_or(ts, |cur| cur.min(ts)));
                }
                None => return Decision::Run(RunReason::OutputMissing(output.clone())),
            }
        }
        let Some(oldest_output) = oldest_output else {
            return Decision::Run(RunReason::NoOutputs);
        };

        for input in task.inputs() {
            match self.stamps.get_or_query(self.fs, input) {
                Some(ts) if ts > oldest_output => {
                    return Decision::Run(RunReason::InputNewer(input.clone()));
                }
                Some(_) => {}
                None => return Decision::Run(RunReason::InputMissing(input.clone())),
            }
        }

        Decision::Skip
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::task::{RunContext, TaskFuture};

    #[derive(Debug)]
    struct Step {
        label: String,
        inputs: Vec<PathBuf>,
        outputs: Vec<PathBuf>,
        force: bool,
    }

    impl Task for Step {
        fn inputs(&self) -> &[PathBuf] {
            &self.inputs
        }
        fn outputs(&self) -> &[PathBuf] {
            &self.outputs
        }
        fn label(&self) -> &str {
            &self.label
        }
        fn force_execute(&self) -> bool {
            self.force
        }
        fn execute<'a>(&'a self, _ctx: &'a RunContext) -> TaskFuture<'a> {
            Box::pin(async { Ok(true) })
        }
    }

    fn step(label: &str, input: &str, output: &str) -> Box<dyn Task> {
        Box::new(Step {
            label: label.to_string(),
            inputs: vec![PathBuf::from(input)],
            outputs: vec![PathBuf::from(output)],
            force: false,
        })
    }

    /// a.c -> cpp -> a.i -> gcc -> a.o
    fn chain() -> Vec<Box<dyn Task>> {
        vec![step("cpp", "a.c", "a.i"), step("gcc", "a.i", "a.o")]
    }

    fn decide_all(fs: &MockFileSystem, tasks: &[Box<dyn Task>], force: bool) -> Vec<Decision> {
        let graph = DagGraph::build(tasks).unwrap();
        FreshnessFilter::new(fs, force).evaluate(&graph, tasks)
    }

    #[test]
    fn everything_fresh_is_skipped() {
        let fs = MockFileSystem::new();
        fs.add_file("a.c", "");
        fs.add_file("a.i", "");
        fs.add_file("a.o", "");

        assert_eq!(decide_all(&fs, &chain(), false), vec![Decision::Skip, Decision::Skip]);
    }

    #[test]
    fn equal_timestamps_count_as_fresh() {
        let fs = MockFileSystem::new();
        fs.add_file_at("a.c", "", 10);
        fs.add_file_at("a.i", "", 10);
        fs.add_file_at("a.o", "", 10);

        assert!(decide_all(&fs, &chain(), false).iter().all(Decision::is_skip));
    }

    #[test]
    fn touched_source_reruns_the_whole_chain() {
        let fs = MockFileSystem::new();
        fs.add_file("a.c", "");
        fs.add_file("a.i", "");
        fs.add_file("a.o", "");
        fs.touch("a.c").unwrap();

        assert_eq!(
            decide_all(&fs, &chain(), false),
            vec![
                Decision::Run(RunReason::InputNewer(PathBuf::from("a.c"))),
                Decision::Run(RunReason::UpstreamRuns(0)),
            ]
        );
    }

    #[test]
    fn missing_output_reruns_only_downstream_of_it() {
        let fs = MockFileSystem::new();
        fs.add_file("a.c", "");
        fs.add_file("a.i", "");

        assert_eq!(
            decide_all(&fs, &chain(), false),
            vec![
                Decision::Skip,
                Decision::Run(RunReason::OutputMissing(PathBuf::from("a.o"))),
            ]
        );
    }

    #[test]
    fn missing_input_forces_a_run() {
        let fs = MockFileSystem::new();
        fs.add_file("a.i", "");
        let decisions = decide_all(&fs, &chain(), false);
        assert_eq!(
            decisions[0],
            Decision::Run(RunReason::InputMissing(PathBuf::from("a.c")))
        );
    }

    #[test]
    fn force_flags_and_empty_outputs_never_skip() {
        let fs = MockFileSystem::new();
        fs.add_file("a.c", "");
        fs.add_file("a.i", "");
        fs.add_file("a.o", "");

        assert!(decide_all(&fs, &chain(), true)
            .iter()
            .all(|d| *d == Decision::Run(RunReason::ForcedRun)));

        let tasks: Vec<Box<dyn Task>> = vec![
            Box::new(Step {
                label: "always".into(),
                inputs: vec![PathBuf::from("a.c")],
                outputs: vec![PathBuf::from("a.i")],
                force: true,
            }),
            Box::new(Step {
                label: "check".into(),
                inputs: vec![PathBuf::from("a.o")],
                outputs: vec![],
                force: false,
            }),
        ];
        assert_eq!(
            decide_all(&fs, &tasks, false),
            vec![
                Decision::Run(RunReason::ForceExecute),
                Decision::Run(RunReason::NoOutputs),
            ]
        );
    }
}
