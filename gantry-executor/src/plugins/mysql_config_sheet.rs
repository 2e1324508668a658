//! Config-sheet backend
//!
//! Sheet import runs elsewhere in the pipeline process once the task has
//! begun; only the persisted task record is consulted here. Unlike the
//! API-test executor, `start` does not resolve the promise, so callers
//! fall back to polling `status`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use gantry_core::domain::task::PipelineTask;
use gantry_core::status::{PipelineStatus, PipelineStatusDesc};
use gantry_core::{Kind, Name};

use crate::error::ExecutorResult;
use crate::types::{ActionExecutor, TaskPromise};

pub const KIND: &str = "MYSQLCONFIGSHEET";

/// Executor for config-sheet import tasks
pub struct MysqlConfigSheetExecutor {
    kind: Kind,
    name: Name,
}

impl MysqlConfigSheetExecutor {
    pub fn new(name: Name, _options: &HashMap<String, String>) -> anyhow::Result<Self> {
        Ok(Self {
            kind: Kind::new(KIND)?,
            name,
        })
    }
}

#[async_trait]
impl ActionExecutor for MysqlConfigSheetExecutor {
    fn kind(&self) -> Kind {
        self.kind.clone()
    }

    fn name(&self) -> Name {
        self.name.clone()
    }

    async fn create(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }

    async fn start(&self, _task: &PipelineTask, _promise: TaskPromise) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }

    async fn status(&self, task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc> {
        if task.status.is_end_status() {
            let desc = task
                .result
                .as_ref()
                .map(|r| r.errors.join("; "))
                .unwrap_or_default();
            return Ok(PipelineStatusDesc::new(task.status, desc));
        }
        if task.time_begin.is_some() {
            return Ok(PipelineStatusDesc::new(PipelineStatus::Running, ""));
        }
        Ok(PipelineStatusDesc::new(PipelineStatus::Created, ""))
    }

    async fn cancel(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }

    async fn remove(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::task_promise;

    fn executor() -> MysqlConfigSheetExecutor {
        MysqlConfigSheetExecutor::new(Name::new("SHEET1").unwrap(), &HashMap::new()).unwrap()
    }

    #[tokio::test]
    async fn test_status_before_begin_is_created() {
        let exec = executor();
        let desc = exec.status(&PipelineTask::default()).await.unwrap();
        assert_eq!(desc.status, PipelineStatus::Created);
    }

    #[tokio::test]
    async fn test_start_leaves_promise_unresolved() {
        let exec = executor();
        let (promise, future) = task_promise();

        exec.start(&PipelineTask::default(), promise).await.unwrap();
        assert!(future.wait().await.is_none());
    }
}
