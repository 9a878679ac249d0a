// src/errors.rs

//! Crate-wide error types.
//!
//! - [`StructuralError`] covers graph defects found before any task runs.
//! - [`BuilddagError`] is the crate-level error used by config loading and
//!   the runtime shell.
//!
//! Task-level faults stay as [`anyhow::Error`] and are recorded in the run
//! report rather than propagated.

use std::path::PathBuf;

use thiserror::Error;

/// A pre-execution defect of the task set. Any of these aborts the run with
/// zero tasks executed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("dependency cycle between tasks: {}", tasks.join(", "))]
    DependencyCycle { tasks: Vec<String> },

    #[error("output file {path:?} is produced by both '{first}' and '{second}'")]
    AmbiguousProducer {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("missing input file {path:?} of task '{task}'")]
    MissingInput { path: PathBuf, task: String },

    #[error("task '{task}' failed to prepare: {message}")]
    PrepareFailed { task: String, message: String },
}

#[derive(Error, Debug)]
pub enum BuilddagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuilddagError>;
