// src/task/mod.rs

//! The task contract.
//!
//! Every compilation step (preprocess, compile, link, file generation...)
//! implements [`Task`]. The scheduler only ever sees this trait: declared
//! inputs and outputs drive the dependency graph, `force_execute` and the
//! output/input timestamps drive the freshness filter, and `execute` does the
//! actual work on a worker.
//!
//! - [`command`] provides [`CommandTask`], which runs an external program.
//! - [`file_provider`] provides [`FileProviderTask`], which writes a
//!   generated file.

use std::fmt::Debug;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use crate::config::ExecConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::fs::{FileSystem, RealFileSystem};

pub mod command;
pub mod file_provider;

pub use command::CommandTask;
pub use file_provider::FileProviderTask;

/// Future returned by [`Task::execute`].
///
/// `Ok(true)` means success, `Ok(false)` a failure the task reported itself,
/// and `Err(_)` an execution fault.
pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;

/// One unit of compilation work.
///
/// Inputs and outputs must not change once the task is submitted. After
/// `execute` resolves to `Ok(true)` every declared output must exist; the
/// scheduler relies on this without checking it.
pub trait Task: Send + Sync + Debug {
    /// Files read by this task, in declaration order.
    fn inputs(&self) -> &[PathBuf];

    /// Files written by this task, in declaration order.
    fn outputs(&self) -> &[PathBuf];

    /// Human-readable name used in logs and diagnostics.
    fn label(&self) -> &str;

    /// When true the freshness filter never skips this task.
    fn force_execute(&self) -> bool {
        false
    }

    /// Called exactly once before the graph is built, even for tasks that
    /// end up skipped. Must not perform the expensive work.
    fn prepare(&mut self, _ctx: &RunContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Perform the work. Called at most once per run, from any worker.
    fn execute<'a>(&'a self, ctx: &'a RunContext) -> TaskFuture<'a>;
}

/// Read-only context shared by every task of a run.
///
/// Cloning is cheap; the sink is the only part tasks may write to.
#[derive(Debug, Clone)]
pub struct RunContext {
    config: Arc<ExecConfig>,
    sink: Arc<dyn DiagnosticSink>,
    fs: Arc<dyn FileSystem>,
}

impl RunContext {
    pub fn new(
        config: ExecConfig,
        sink: Arc<dyn DiagnosticSink>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sink,
            fs,
        }
    }

    /// Context on the real filesystem with diagnostics going to `tracing`.
    pub fn with_defaults(config: ExecConfig) -> Self {
        Self::new(config, Arc::new(TracingSink), Arc::new(RealFileSystem))
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    pub fn working_dir(&self) -> &Path {
        &self.config.working_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    /// Append a diagnostic to the shared sink.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(diagnostic);
    }
}
