// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::MissingInputPolicy;

/// Configuration file as read from TOML, before validation.
///
/// ```toml
/// [exec]
/// jobs = 4
/// force = false
/// keep_going = false
/// missing_inputs = "warn"
/// working_dir = "."
/// output_dir = "build"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub exec: RawExecSection,
}

/// `[exec]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawExecSection {
    /// Maximum number of tasks running at once.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Execute every task, ignoring freshness.
    #[serde(default)]
    pub force: bool,

    /// Keep dispatching independent tasks after a failure.
    #[serde(default)]
    pub keep_going: bool,

    #[serde(default)]
    pub missing_inputs: MissingInputPolicy,

    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

fn default_jobs() -> usize {
    1
}

impl Default for RawExecSection {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            force: false,
            keep_going: false,
            missing_inputs: MissingInputPolicy::default(),
            working_dir: None,
            output_dir: None,
        }
    }
}

/// Validated execution configuration for one run.
///
/// Only `parallelism`, `force`, `keep_going` and `missing_inputs` are read by
/// the scheduler. The directories are context for tasks: commands run in
/// `working_dir` and generated files with relative paths land in
/// `output_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecConfig {
    pub parallelism: usize,
    pub force: bool,
    pub keep_going: bool,
    pub missing_inputs: MissingInputPolicy,
    pub working_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            parallelism: 1,
            force: false,
            keep_going: false,
            missing_inputs: MissingInputPolicy::Warn,
            working_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values below 1 are clamped to 1.
    pub fn with_parallelism(mut self, jobs: usize) -> Self {
        self.parallelism = jobs.max(1);
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    pub fn with_missing_inputs(mut self, policy: MissingInputPolicy) -> Self {
        self.missing_inputs = policy;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Parallelism actually used by the scheduler (never 0).
    pub fn effective_parallelism(&self) -> usize {
        self.parallelism.max(1)
    }

    pub(crate) fn new_unchecked(raw: RawExecSection) -> Self {
        let working_dir = raw.working_dir.unwrap_or_else(|| PathBuf::from("."));
        let output_dir = raw.output_dir.unwrap_or_else(|| working_dir.clone());
        Self {
            parallelism: raw.jobs,
            force: raw.force,
            keep_going: raw.keep_going,
            missing_inputs: raw.missing_inputs,
            working_dir,
            output_dir,
        }
    }
}
