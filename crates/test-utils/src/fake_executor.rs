use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use builddag::dag::NodeId;
use builddag::engine::{FailureDetail, RuntimeEvent, TaskOutcome};
use builddag::errors::Result;
use builddag::exec::ExecutorBackend;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which nodes were dispatched
/// - immediately reports `TaskCompleted` for each of them, failing the ones
///   listed in `failing`.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<NodeId>>>,
    failing: HashSet<NodeId>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, dispatched: Arc<Mutex<Vec<NodeId>>>) -> Self {
        Self {
            runtime_tx,
            dispatched,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, node: NodeId) -> Self {
        self.failing.insert(node);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        nodes: Vec<NodeId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);
        let failing = self.failing.clone();

        Box::pin(async move {
            for node in nodes {
                {
                    let mut guard = dispatched.lock().unwrap();
                    guard.push(node);
                }

                let outcome = if failing.contains(&node) {
                    TaskOutcome::Failed(FailureDetail::ReturnedFailure)
                } else {
                    TaskOutcome::Success
                };

                tx.send(RuntimeEvent::TaskCompleted { node, outcome })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
