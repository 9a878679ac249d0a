// src/diagnostics.rs

//! Diagnostic sink shared by the scheduler and tasks.
//!
//! The sink is append-only and must tolerate concurrent appends from every
//! worker. [`MemorySink`] collects entries for the caller; [`TracingSink`]
//! forwards them to `tracing`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{error, warn};

pub use crate::types::Severity;

/// One user-facing diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Label of the task this entry is about, if any.
    pub task: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            task: None,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            task: None,
            message: message.into(),
        }
    }

    pub fn for_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        match self.task {
            Some(ref task) => write!(f, "{level}: [{task}] {}", self.message),
            None => write!(f, "{level}: {}", self.message),
        }
    }
}

/// Append-only, concurrency-safe receiver of diagnostics.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that keeps every entry in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the entries reported so far, in arrival order.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .cloned()
            .collect()
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl DiagnosticSink for MemorySink {
    fn report(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        let task = diagnostic.task.as_deref().unwrap_or("-");
        match diagnostic.severity {
            Severity::Warning => warn!(task = %task, "{}", diagnostic.message),
            Severity::Error => error!(task = %task, "{}", diagnostic.message),
        }
    }
}
