//! API-test backend
//!
//! The test run happens synchronously inside the pipeline process and its
//! outcome is written to the task record. `status` therefore answers from
//! the persisted record alone and never talks to a remote system.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use gantry_core::domain::task::PipelineTask;
use gantry_core::status::{PipelineStatus, PipelineStatusDesc};
use gantry_core::{Kind, Name};

use crate::error::ExecutorResult;
use crate::types::{ActionExecutor, TaskPromise};

pub const KIND: &str = "APITEST";

/// Executor for in-process API test tasks
pub struct ApiTestExecutor {
    kind: Kind,
    name: Name,
}

impl ApiTestExecutor {
    pub fn new(name: Name, _options: &HashMap<String, String>) -> anyhow::Result<Self> {
        Ok(Self {
            kind: Kind::new(KIND)?,
            name,
        })
    }
}

#[async_trait]
impl ActionExecutor for ApiTestExecutor {
    fn kind(&self) -> Kind {
        self.kind.clone()
    }

    fn name(&self) -> Name {
        self.name.clone()
    }

    async fn create(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }

    /// The execution step runs to completion right here, so the promise
    /// resolves before start returns
    async fn start(&self, task: &PipelineTask, promise: TaskPromise) -> ExecutorResult<Value> {
        debug!("api test executed, task {}", task.id);
        promise.resolve(PipelineStatusDesc::new(
            PipelineStatus::Success,
            "api test executed",
        ));
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
