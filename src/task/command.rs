// src/task/command.rs

//! Task that runs an external program (preprocessor, compiler, linker...).

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{debug, error, info};

use super::{RunContext, Task, TaskFuture};

/// Runs `program args...` and succeeds when the process exits with status 0.
///
/// stdout and stderr are captured. They are only logged when the process
/// fails, together with the full command line, so a successful build stays
/// quiet.
#[derive(Debug, Clone)]
pub struct CommandTask {
    label: String,
    program: String,
    args: Vec<String>,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    current_dir: Option<PathBuf>,
    force: bool,
    /// Working directory fixed by `prepare`.
    resolved_dir: Option<PathBuf>,
}

impl CommandTask {
    pub fn new(label: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            program: program.into(),
            args: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            current_dir: None,
            force: false,
            resolved_dir: None,
        }
    }

    /// Run `cmdline` through the platform shell.
    pub fn shell(label: impl Into<String>, cmdline: impl Into<String>) -> Self {
        if cfg!(windows) {
            Self::new(label, "cmd").arg("/C").arg(cmdline)
        } else {
            Self::new(label, "sh").arg("-c").arg(cmdline)
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.outputs.push(path.into());
        self
    }

    /// Directory to run in; relative paths are taken from the run's working
    /// directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Full command line, space separated, for logging.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn run_dir<'a>(&'a self, ctx: &'a RunContext) -> &'a Path {
        self.resolved_dir.as_deref().unwrap_or_else(|| ctx.working_dir())
    }

    async fn run(&self, ctx: &RunContext) -> Result<bool> {
        let cmdline = self.command_line();
        info!(task = %self.label, "running");
        debug!(task = %self.label, cmd = %cmdline, "command line");

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(self.run_dir(ctx))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("spawning process for task '{}'", self.label))?;

        if output.status.success() {
            debug!(task = %self.label, "process exited successfully");
            return Ok(true);
        }

        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        error!(
            task = %self.label,
            cmd = %cmdline,
            exit_code = output.status.code().unwrap_or(-1),
            "command failed:\n{}",
            captured.trim_end()
        );
        Ok(false)
    }
}

impl Task for CommandTask {
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

    fn prepare(&mut self, ctx: &RunContext) -> Result<()> {
        let dir = match self.current_dir {
            Some(ref dir) if dir.is_relative() => ctx.working_dir().join(dir),
            Some(ref dir) => dir.clone(),
            None => ctx.working_dir().to_path_buf(),
        };
        self.resolved_dir = Some(dir);

        for output in &self.outputs {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() && !ctx.fs().exists(parent) {
                    ctx.fs().create_dir_all(parent)?;
                }
            }
        }
        Ok(())
    }

    fn execute<'a>(&'a self, ctx: &'a RunContext) -> TaskFuture<'a> {
        Box::pin(self.run(ctx))
    }
}
