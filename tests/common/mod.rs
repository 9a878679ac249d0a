#![allow(dead_code)]

use std::path::Path;

use builddag::Task;
pub use builddag_test_utils::{FakeTask, Probe, init_tracing, mock_context, with_timeout};

/// T1 -> T2 -> ... -> Tn, each consuming the previous output. T1 reads
/// `f0`, which tests seed themselves.
pub fn chain(len: usize, probe: &Probe) -> Vec<FakeTask> {
    (1..=len)
        .map(|i| {
            FakeTask::new(&format!("T{i}"))
                .input(format!("f{}", i - 1))
                .output(format!("f{i}"))
                .probe(probe)
        })
        .collect()
}

pub fn boxed(tasks: Vec<FakeTask>) -> Vec<Box<dyn Task>> {
    tasks.into_iter().map(FakeTask::boxed).collect()
}

/// Sources of the compiler pipeline; seed these before running
/// [`compiler_pipeline`].
pub const SOURCES: &[&str] = &["main.c", "util.c", "parser.c", "lexer.c"];
pub const MODULE: &str = "component.m";

/// A small compiler pipeline rooted at `dir`:
///
/// - `mpp` turns `component.m` into `component.c` + `component.h`
/// - `cpp(x)` preprocesses `x.c` (and `component.h`) into `x.i`
/// - `gcc(x)` compiles `x.i` into `x.o`, also `component.c`
/// - `link` combines every object into `exec`
///
/// Tasks are listed in an order that differs from the dependency order.
pub fn compiler_pipeline(dir: &Path, probe: &Probe, delay_ms: u64) -> Vec<FakeTask> {
    let mut tasks = Vec::new();

    let mut link = FakeTask::new("link").output(dir.join("exec")).probe(probe);
    for src in SOURCES.iter().copied().chain(["component.c"]) {
        let stem = src.trim_end_matches(".c");
        link = link.input(dir.join(format!("{stem}.o")));
    }
    tasks.push(link.delay_ms(delay_ms));

    for src in SOURCES.iter().copied().chain(["component.c"]) {
        let stem = src.trim_end_matches(".c");
        let input = if src == "component.c" {
            dir.join("component.c")
        } else {
            dir.join(format!("{stem}.i"))
        };
        tasks.push(
            FakeTask::new(&format!("gcc({stem})"))
                .input(input)
                .output(dir.join(format!("{stem}.o")))
                .delay_ms(delay_ms)
                .probe(probe),
        );
    }

    for src in SOURCES {
        let stem = src.trim_end_matches(".c");
        tasks.push(
            FakeTask::new(&format!("cpp({stem})"))
                .input(dir.join(src))
                .input(dir.join("component.h"))
                .output(dir.join(format!("{stem}.i")))
                .delay_ms(delay_ms)
                .probe(probe),
        );
    }

    tasks.push(
        FakeTask::new("mpp")
            .input(dir.join(MODULE))
            .output(dir.join("component.c"))
            .output(dir.join("component.h"))
            .delay_ms(delay_ms)
            .probe(probe),
    );

    tasks
}

/// `(producer, consumer)` label pairs implied by [`compiler_pipeline`].
pub fn pipeline_edges() -> Vec<(String, String)> {
    let mut edges = Vec::new();
    for src in SOURCES {
        let stem = src.trim_end_matches(".c");
        edges.push(("mpp".to_string(), format!("cpp({stem})")));
        edges.push((format!("cpp({stem})"), format!("gcc({stem})")));
        edges.push((format!("gcc({stem})"), "link".to_string()));
    }
    edges.push(("mpp".to_string(), "gcc(component)".to_string()));
    edges.push(("gcc(component)".to_string(), "link".to_string()));
    edges
}
