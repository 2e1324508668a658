//! Executor contract and task completion primitives

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{Semaphore, oneshot, watch};
use tracing::warn;

use gantry_core::domain::task::{PipelineTask, TaskInspect};
use gantry_core::status::{PipelineStatus, PipelineStatusDesc};
use gantry_core::{Kind, Name};

use crate::error::{ExecutorError, ExecutorResult};

/// Parallelism bound for best-effort batch cleanup
const BATCH_DELETE_CONCURRENCY: usize = 10;

/// What an existence probe learned about a task's remote unit
///
/// `created` means the backend has a record of the job; `started` means
/// the underlying workload began executing. `started` implies `created`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Existence {
    pub created: bool,
    pub started: bool,
}

/// Derives existence from an already-translated status report
///
/// `Error`/`Unknown` mean the probe itself is unusable and the caller
/// must not guess; `NotFoundInCluster` is the one status that proves the
/// unit was never created.
pub fn existence_from_status(desc: &PipelineStatusDesc) -> ExecutorResult<Existence> {
    match desc.status {
        PipelineStatus::Error | PipelineStatus::Unknown => Err(ExecutorError::UnexpectedStatus(
            format!("failed to judge job existence, detail: {}", desc),
        )),
        PipelineStatus::NotFoundInCluster => Ok(Existence {
            created: false,
            started: false,
        }),
        PipelineStatus::Created | PipelineStatus::StartError => Ok(Existence {
            created: true,
            started: false,
        }),
        PipelineStatus::Queue
        | PipelineStatus::Running
        | PipelineStatus::Success
        | PipelineStatus::Failed
        | PipelineStatus::StopByUser => Ok(Existence {
            created: true,
            started: true,
        }),
        _ => Ok(Existence {
            created: true,
            started: false,
        }),
    }
}

/// Creates a linked promise/future pair for one task execution
///
/// The promise travels into `ActionExecutor::start`; the future stays
/// with the caller, which can await completion or signal cancellation.
pub fn task_promise() -> (TaskPromise, TaskFuture) {
    let (tx, rx) = oneshot::channel();
    let (cancel_tx, cancel_rx) = watch::channel(false);
    (
        TaskPromise {
            tx,
            cancel: cancel_rx,
        },
        TaskFuture {
            rx,
            cancel: cancel_tx,
        },
    )
}

/// Write-side of a task completion signal, owned by the executor
#[derive(Debug)]
pub struct TaskPromise {
    tx: oneshot::Sender<PipelineStatusDesc>,
    cancel: watch::Receiver<bool>,
}

impl TaskPromise {
    /// Publish the terminal status. A missing listener is not an error;
    /// the reconciler may have moved on to polling.
    pub fn resolve(self, desc: PipelineStatusDesc) {
        let _ = self.tx.send(desc);
    }

    /// Completes once the caller cancels or drops the future side
    pub async fn cancelled(&mut self) {
        // wait_for errs when the sender is gone; nobody waiting is
        // equivalent to cancellation
        let _ = self.cancel.wait_for(|cancelled| *cancelled).await;
    }
}

/// Read-side of a task completion signal, kept by the caller
#[derive(Debug)]
pub struct TaskFuture {
    rx: oneshot::Receiver<PipelineStatusDesc>,
    cancel: watch::Sender<bool>,
}

impl TaskFuture {
    /// Ask the executor to stop waiting. Does not tear down remote
    /// resources; that stays an explicit cancel/remove call.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Waits for the executor to resolve the task
    ///
    /// `None` means the promise was dropped unresolved, e.g. by an
    /// executor that only supports polling.
    pub async fn wait(self) -> Option<PipelineStatusDesc> {
        self.rx.await.ok()
    }
}

/// Remote job lifecycle contract, implemented once per backend
///
/// `create` and `start` must be idempotent: repeating either when the
/// remote unit already exists is a successful no-op. No operation
/// retries internally; retry cadence belongs to the reconciler.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    fn kind(&self) -> Kind;
    fn name(&self) -> Name;

    /// Probe whether the task's remote unit was created and started
    async fn exist(&self, task: &PipelineTask) -> ExecutorResult<Existence> {
        match self.status(task).await {
            Ok(desc) => existence_from_status(&desc),
            Err(e) if e.is_not_found() => Ok(Existence::default()),
            Err(e) => Err(e),
        }
    }

    /// Register the remote unit without starting it
    async fn create(&self, task: &PipelineTask) -> ExecutorResult<Value>;

    /// Start the remote unit, creating it first if needed
    ///
    /// Executors that complete in-process resolve `promise` when done;
    /// backend-polled executors drop it and rely on `status`.
    async fn start(&self, task: &PipelineTask, promise: TaskPromise) -> ExecutorResult<Value>;

    async fn update(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        let _ = task;
        Err(ExecutorError::Unsupported {
            kind: self.kind().to_string(),
            op: "update",
        })
    }

    /// Translate the backend's current view into the shared status model
    async fn status(&self, task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc>;

    /// Fetch human-oriented diagnostics for a task
    async fn inspect(&self, task: &PipelineTask) -> ExecutorResult<TaskInspect> {
        let _ = task;
        Err(ExecutorError::Unsupported {
            kind: self.kind().to_string(),
            op: "inspect",
        })
    }

    /// Stop the workload but keep its record for inspection
    async fn cancel(&self, task: &PipelineTask) -> ExecutorResult<Value>;

    /// Delete the remote unit and its record
    async fn remove(&self, task: &PipelineTask) -> ExecutorResult<Value>;

    /// Tear down everything the task owns remotely
    async fn destroy(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.remove(task).await
    }

    /// Delete the task's namespace once the whole pipeline is reclaimed
    async fn delete_namespace(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        let _ = task;
        Err(ExecutorError::Unsupported {
            kind: self.kind().to_string(),
            op: "delete namespace",
        })
    }

    /// Best-effort cleanup of many tasks
    ///
    /// Removals run concurrently under a fixed bound. Tasks without a
    /// UUID never reached a backend and are skipped, "not found" results
    /// are skipped, and any other failure fails the batch after all
    /// removals have settled.
    async fn batch_delete(&self, tasks: &[PipelineTask]) -> ExecutorResult<Value> {
        let semaphore = Arc::new(Semaphore::new(BATCH_DELETE_CONCURRENCY));
        let removals = tasks
            .iter()
            .filter(|task| !task.extra.uuid.is_empty())
            .map(|task| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore.acquire().await.ok();
                    self.remove(task).await.map_err(|e| (task.id, e))
                }
            });

        let mut failures = Vec::new();
        for result in join_all(removals).await {
            match result {
                Ok(_) => {}
                Err((task_id, e)) if e.is_not_found() => {
                    warn!("skip remove of missing job, task {}: {}", task_id, e);
                }
                Err((task_id, e)) => failures.push(format!("task {}: {}", task_id, e)),
            }
        }
        if !failures.is_empty() {
            return Err(ExecutorError::Reply(format!(
                "batch delete left {} job(s) undeleted: {}",
                failures.len(),
                failures.join("; ")
            )));
        }
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_existence_from_status_table() {
        let cases = [
            (PipelineStatus::Created, (true, false)),
            (PipelineStatus::StartError, (true, false)),
            (PipelineStatus::Queue, (true, true)),
            (PipelineStatus::Running, (true, true)),
            (PipelineStatus::Success, (true, true)),
            (PipelineStatus::Failed, (true, true)),
            (PipelineStatus::StopByUser, (true, true)),
            (PipelineStatus::NotFoundInCluster, (false, false)),
            (PipelineStatus::Analyzed, (true, false)),
        ];
        for (status, (created, started)) in cases {
            let existence =
                existence_from_status(&PipelineStatusDesc::new(status, "")).unwrap();
            assert_eq!(existence.created, created, "created for {status}");
            assert_eq!(existence.started, started, "started for {status}");
        }
    }

    #[test]
    fn test_existence_unjudgeable_statuses() {
        for status in [PipelineStatus::Error, PipelineStatus::Unknown] {
            let err = existence_from_status(&PipelineStatusDesc::new(status, "boom"));
            assert!(err.is_err(), "{status} must not be judged");
        }
    }

    #[tokio::test]
    async fn test_promise_resolution() {
        let (promise, future) = task_promise();
        promise.resolve(PipelineStatusDesc::new(PipelineStatus::Success, "done"));
        let desc = future.wait().await.unwrap();
        assert_eq!(desc.status, PipelineStatus::Success);
    }

    #[tokio::test]
    async fn test_promise_observes_cancellation() {
        let (mut promise, future) = task_promise();
        future.cancel();
        promise.cancelled().await;
    }

    #[tokio::test]
    async fn test_dropped_future_reads_as_cancellation() {
        let (mut promise, future) = task_promise();
        drop(future);
        promise.cancelled().await;
    }

    struct RecordingExecutor {
        removed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ActionExecutor for RecordingExecutor {
        fn kind(&self) -> Kind {
            Kind::new("MEMORY").unwrap()
        }

        fn name(&self) -> Name {
            Name::new("MEMORY").unwrap()
        }

        async fn create(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
            Ok(Value::Null)
        }

        async fn start(&self, _task: &PipelineTask, _promise: TaskPromise) -> ExecutorResult<Value> {
            Ok(Value::Null)
        }

        async fn status(&self, _task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc> {
            Ok(PipelineStatusDesc::new(PipelineStatus::Running, ""))
        }

        async fn cancel(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
            Ok(Value::Null)
        }

        async fn remove(&self, task: &PipelineTask) -> ExecutorResult<Value> {
            if task.extra.uuid == "missing" {
                return Err(ExecutorError::EmptyStatus {
                    last_message: "not found".to_string(),
                });
            }
            self.removed.lock().unwrap().push(task.extra.uuid.clone());
            Ok(Value::Null)
        }
    }

    fn task_with_uuid(uuid: &str) -> PipelineTask {
        let mut task = PipelineTask::default();
        task.extra.uuid = uuid.to_string();
        task
    }

    #[tokio::test]
    async fn test_batch_delete_skips_blank_and_missing() {
        let exec = RecordingExecutor {
            removed: Mutex::new(Vec::new()),
        };
        let tasks = vec![
            task_with_uuid("u1"),
            task_with_uuid(""),
            task_with_uuid("missing"),
            task_with_uuid("u2"),
        ];
        exec.batch_delete(&tasks).await.unwrap();

        let mut removed = exec.removed.lock().unwrap().clone();
        removed.sort();
        assert_eq!(removed, vec!["u1".to_string(), "u2".to_string()]);
    }

    #[tokio::test]
    async fn test_default_exist_derives_from_status() {
        let exec = RecordingExecutor {
            removed: Mutex::new(Vec::new()),
        };
        let existence = exec.exist(&task_with_uuid("u1")).await.unwrap();
        assert!(existence.created);
        assert!(existence.started);
    }
}
