// src/exec/task_runner.rs

//! Individual task runner.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::NodeId;
use crate::engine::{FailureDetail, RuntimeEvent, TaskOutcome};
use crate::task::{RunContext, Task};

/// Run a single task body and emit its `TaskCompleted` event.
///
/// The body runs in its own Tokio task so that a panic is caught and turned
/// into [`FailureDetail::Fault`] instead of taking the worker down.
pub async fn run_task(
    node: NodeId,
    task: Arc<dyn Task>,
    ctx: RunContext,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    let label = task.label().to_string();
    info!(task = %label, node, "starting task");

    let handle = tokio::spawn(async move { task.execute(&ctx).await });

    let outcome = match handle.await {
        Ok(Ok(true)) => {
            info!(task = %label, node, "task finished");
            TaskOutcome::Success
        }
        Ok(Ok(false)) => {
            warn!(task = %label, node, "task reported failure");
            TaskOutcome::Failed(FailureDetail::ReturnedFailure)
        }
        Ok(Err(err)) => {
            error!(task = %label, node, error = %format!("{err:#}"), "task execution error");
            TaskOutcome::Failed(FailureDetail::Fault(format!("{err:#}")))
        }
        Err(join) if join.is_panic() => {
            let message = panic_message(join.into_panic());
            error!(task = %label, node, panic = %message, "task panicked");
            TaskOutcome::Failed(FailureDetail::Fault(format!("panicked: {message}")))
        }
        Err(join) => {
            warn!(task = %label, node, error = %join, "task was cancelled");
            TaskOutcome::Failed(FailureDetail::Interrupted)
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted { node, outcome })
        .await
        .is_err()
    {
        debug!(task = %label, node, "runtime is gone; dropping completion");
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::ExecConfig;
    use crate::fs::mock::MockFileSystem;
    use crate::diagnostics::MemorySink;
    use crate::task::TaskFuture;

    #[derive(Debug)]
    enum Body {
        Ok,
        Fail,
        Error,
        Panic,
    }

    #[derive(Debug)]
    struct Probe(Body);

    impl Task for Probe {
        fn inputs(&self) -> &[PathBuf] {
            &[]
        }
        fn outputs(&self) -> &[PathBuf] {
            &[]
        }
        fn label(&self) -> &str {
            "probe"
        }
        fn execute<'a>(&'a self, _ctx: &'a RunContext) -> TaskFuture<'a> {
            Box::pin(async move {
                match self.0 {
                    Body::Ok => Ok(true),
                    Body::Fail => Ok(false),
                    Body::Error => Err(anyhow::anyhow!("compiler crashed")),
                    Body::Panic => panic!("index out of bounds"),
                }
            })
        }
    }

    async fn outcome_of(body: Body) -> TaskOutcome {
        let ctx = RunContext::new(
            ExecConfig::default(),
            Arc::new(MemorySink::new()),
            Arc::new(MockFileSystem::new()),
        );
        let (tx, mut rx) = mpsc::channel(1);
        run_task(7, Arc::new(Probe(body)), ctx, &tx).await;
        match rx.recv().await {
            Some(RuntimeEvent::TaskCompleted { node, outcome }) => {
                assert_eq!(node, 7);
                outcome
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn maps_results_to_outcomes() {
        assert_eq!(outcome_of(Body::Ok).await, TaskOutcome::Success);
        assert_eq!(
            outcome_of(Body::Fail).await,
            TaskOutcome::Failed(FailureDetail::ReturnedFailure)
        );
        assert_eq!(
            outcome_of(Body::Error).await,
            TaskOutcome::Failed(FailureDetail::Fault("compiler crashed".into()))
        );
    }

    #[tokio::test]
    async fn panic_becomes_fault() {
        assert_eq!(
            outcome_of(Body::Panic).await,
            TaskOutcome::Failed(FailureDetail::Fault("panicked: index out of bounds".into()))
        );
    }
}
