//! Demo backend
//!
//! The smallest possible plugin: every task reports an immediate success.
//! Serves as a template for new backends.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use gantry_core::domain::task::PipelineTask;
use gantry_core::status::{PipelineStatus, PipelineStatusDesc};
use gantry_core::{Kind, Name};

use crate::error::ExecutorResult;
use crate::types::{ActionExecutor, TaskPromise};

pub const KIND: &str = "DEMO";

const DONE: &str = "demo task completed";

pub struct DemoExecutor {
    kind: Kind,
    name: Name,
}

impl DemoExecutor {
    pub fn new(name: Name, _options: &HashMap<String, String>) -> anyhow::Result<Self> {
        Ok(Self {
            kind: Kind::new(KIND)?,
            name,
        })
    }
}

#[async_trait]
impl ActionExecutor for DemoExecutor {
    fn kind(&self) -> Kind {
        self.kind.clone()
    }

    fn name(&self) -> Name {
        self.name.clone()
    }

    async fn create(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }

    async fn start(&self, _task: &PipelineTask, promise: TaskPromise) -> ExecutorResult<Value> {
        promise.resolve(PipelineStatusDesc::new(PipelineStatus::Success, DONE));
        Ok(Value::Null)
    }

    async fn status(&self, _task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc> {
        Ok(PipelineStatusDesc::new(PipelineStatus::Success, DONE))
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

    #[tokio::test]
    async fn test_demo_lifecycle() {
        let exec = DemoExecutor::new(Name::new("DEMO1").unwrap(), &HashMap::new()).unwrap();
        let task = PipelineTask::default();

        let desc = exec.status(&task).await.unwrap();
        assert_eq!(desc.status, PipelineStatus::Success);

        let (promise, future) = task_promise();
        exec.start(&task, promise).await.unwrap();
        let resolved = future.wait().await.unwrap();
        assert_eq!(resolved.status, PipelineStatus::Success);
    }
}
