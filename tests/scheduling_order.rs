// tests/scheduling_order.rs

mod common;
use crate::common::{
    Probe, boxed, chain, compiler_pipeline, init_tracing, mock_context, pipeline_edges,
    with_timeout, MODULE, SOURCES,
};

use std::error::Error;
use std::path::Path;

use builddag::dag::NodeState;
use builddag::fs::FileSystem;
use builddag::{ExecConfig, Outcome};

type TestResult = Result<(), Box<dyn Error>>;

fn seed_pipeline_sources(fs: &builddag::fs::mock::MockFileSystem, dir: &Path) {
    for src in SOURCES {
        fs.add_file(dir.join(src), "int main;");
    }
    fs.add_file(dir.join(MODULE), "component");
}

fn assert_happens_before(probe: &Probe) {
    for (producer, consumer) in pipeline_edges() {
        let end = probe.end_of(&producer).expect("producer ran");
        let start = probe.start_of(&consumer).expect("consumer ran");
        assert!(
            end < start,
            "{producer} (end {end}) must finish before {consumer} (start {start})"
        );
    }
}

#[tokio::test]
async fn chain_runs_in_dependency_order() -> TestResult {
    init_tracing();

    let (ctx, fs, sink) = mock_context(ExecConfig::default().with_parallelism(4));
    fs.add_file("f0", "seed");
    let probe = Probe::new();

    let report = with_timeout(builddag::run(boxed(chain(4, &probe)), ctx)).await;

    assert_eq!(report.outcome, Outcome::Success);
    assert_eq!(probe.started(), vec!["T1", "T2", "T3", "T4"]);
    assert_eq!(probe.max_concurrency(), 1);
    assert!(sink.errors().is_empty());
    Ok(())
}

#[tokio::test]
async fn pipeline_respects_dependencies_single_worker() -> TestResult {
    init_tracing();

    let dir = Path::new("build");
    let (ctx, fs, _sink) = mock_context(ExecConfig::default());
    seed_pipeline_sources(&fs, dir);
    let probe = Probe::new();

    let report = with_timeout(builddag::run(boxed(compiler_pipeline(dir, &probe, 0)), ctx)).await;

    assert!(report.is_success());
    assert_eq!(report.executed.len(), 11);
    assert_eq!(probe.max_concurrency(), 1);
    assert_happens_before(&probe);
    assert!(fs.exists(&dir.join("exec")));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pipeline_respects_dependencies_four_workers() -> TestResult {
    init_tracing();

    let dir = Path::new("build");
    let (ctx, fs, _sink) = mock_context(ExecConfig::default().with_parallelism(4));
    seed_pipeline_sources(&fs, dir);
    let probe = Probe::new();

    let report = with_timeout(builddag::run(boxed(compiler_pipeline(dir, &probe, 20)), ctx)).await;

    assert!(report.is_success());
    assert_happens_before(&probe);
    assert!(probe.max_concurrency() <= 4);
    // Four cpp tasks plus gcc(component) become ready together after mpp.
    assert!(probe.max_concurrency() >= 2);
    for label in &report.labels {
        assert_eq!(probe.count(label), 1, "{label} must run exactly once");
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallelism_is_a_hard_bound() -> TestResult {
    init_tracing();

    for jobs in [1usize, 2, 3] {
        let (ctx, _fs, _sink) = mock_context(ExecConfig::default().with_parallelism(jobs));
        let probe = Probe::new();
        let tasks = (0..8)
            .map(|i| {
                common::FakeTask::new(&format!("gen{i}"))
                    .output(format!("out/{i}.c"))
                    .delay_ms(15)
                    .probe(&probe)
            })
            .collect();

        let report = with_timeout(builddag::run(boxed(tasks), ctx)).await;

        assert!(report.is_success());
        assert_eq!(report.executed.len(), 8);
        assert!(
            probe.max_concurrency() <= jobs,
            "observed {} concurrent tasks with -j{jobs}",
            probe.max_concurrency()
        );
    }
    Ok(())
}

#[tokio::test]
async fn same_artifacts_regardless_of_parallelism() -> TestResult {
    init_tracing();

    let dir = Path::new("build");
    let mut artifacts = Vec::new();
    for jobs in [1usize, 4] {
        let (ctx, fs, _sink) = mock_context(ExecConfig::default().with_parallelism(jobs));
        seed_pipeline_sources(&fs, dir);
        let probe = Probe::new();

        let report = with_timeout(builddag::run(boxed(compiler_pipeline(dir, &probe, 0)), ctx)).await;
        assert!(report.is_success());
        assert!(report.states.iter().all(|s| *s == NodeState::Succeeded));
        artifacts.push(report.artifacts);
    }

    assert_eq!(artifacts[0], artifacts[1]);
    assert_eq!(artifacts[0].len(), 12);
    Ok(())
}

#[tokio::test]
async fn empty_task_set_succeeds() -> TestResult {
    let (ctx, _fs, sink) = mock_context(ExecConfig::default());
    let report = with_timeout(builddag::run(Vec::new(), ctx)).await;

    assert_eq!(report.outcome, Outcome::Success);
    assert!(report.executed.is_empty());
    assert!(sink.is_empty());
    Ok(())
}
