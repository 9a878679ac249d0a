// src/exec/mod.rs

//! Task execution layer.
//!
//! This module is responsible for actually calling [`Task::execute`] on a
//! bounded set of workers and reporting back to the orchestration runtime via
//! `RuntimeEvent`s.
//!
//! - [`worker_pool`] owns the fixed-size pool of workers.
//! - [`task_runner`] handles a single `execute` call, including panics.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `WorkerPoolBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.
//!
//! [`Task::execute`]: crate::task::Task::execute

pub mod backend;
pub mod task_runner;
pub mod worker_pool;

pub use backend::{ExecutorBackend, WorkerPoolBackend};
pub use worker_pool::spawn_workers;
