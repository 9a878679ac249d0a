#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use builddag::{RunContext, Task, TaskFuture};

use crate::probe::Probe;

/// What a [`FakeTask`] does when executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behavior {
    /// Write every output (contents = label) and return `Ok(true)`.
    Succeed,
    /// Return `Ok(false)` without writing anything.
    Fail,
    /// Return `Err(message)`.
    Fault(String),
    /// Panic with `message`.
    Panic(String),
}

/// Configurable task for scheduler tests.
///
/// Counts `prepare` and `execute` calls and reports start/end to an optional
/// [`Probe`].
#[derive(Debug, Clone)]
pub struct FakeTask {
    label: String,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    behavior: Behavior,
    delay: Option<Duration>,
    force: bool,
    fail_prepare: bool,
    probe: Option<Probe>,
    prepared: Arc<AtomicUsize>,
    executed: Arc<AtomicUsize>,
}

impl FakeTask {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            behavior: Behavior::Succeed,
            delay: None,
            force: false,
            fail_prepare: false,
            probe: None,
            prepared: Arc::new(AtomicUsize::new(0)),
            executed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn fails(self) -> Self {
        self.behavior(Behavior::Fail)
    }

    pub fn faults(self, message: &str) -> Self {
        self.behavior(Behavior::Fault(message.to_string()))
    }

    pub fn panics(self, message: &str) -> Self {
        self.behavior(Behavior::Panic(message.to_string()))
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn fail_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    pub fn probe(mut self, probe: &Probe) -> Self {
        self.probe = Some(probe.clone());
        self
    }

    /// Shared counter of `prepare` calls; clones see the same value.
    pub fn prepare_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.prepared)
    }

    /// Shared counter of `execute` calls; clones see the same value.
    pub fn execute_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.executed)
    }

    pub fn boxed(self) -> Box<dyn Task> {
        Box::new(self)
    }

    async fn run(&self, ctx: &RunContext) -> anyhow::Result<bool> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        if let Some(ref probe) = self.probe {
            probe.start(&self.label);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match self.behavior {
            Behavior::Succeed => self.write_outputs(ctx),
            Behavior::Fail => Ok(false),
            Behavior::Fault(ref message) => Err(anyhow::anyhow!("{message}")),
            Behavior::Panic(ref message) => {
                if let Some(ref probe) = self.probe {
                    probe.end(&self.label);
                }
                panic!("{message}");
            }
        };

        if let Some(ref probe) = self.probe {
            probe.end(&self.label);
        }
        result
    }

    fn write_outputs(&self, ctx: &RunContext) -> anyhow::Result<bool> {
        for output in &self.outputs {
            ctx.fs().write(output, self.label.as_bytes())?;
        }
        Ok(true)
    }
}

impl Task for FakeTask {
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

    fn prepare(&mut self, _ctx: &RunContext) -> anyhow::Result<()> {
        self.prepared.fetch_add(1, Ordering::SeqCst);
        if self.fail_prepare {
            anyhow::bail!("cannot resolve toolchain for {}", self.label);
        }
        Ok(())
    }

    fn execute<'a>(&'a self, ctx: &'a RunContext) -> TaskFuture<'a> {
        Box::pin(self.run(ctx))
    }
}
