//! In-memory test backend
//!
//! Keeps task progress in process memory: every `status` call advances the
//! task one step along Created, Running, Success. Drives reconciler logic
//! in tests without any remote system behind it.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use gantry_core::domain::task::PipelineTask;
use gantry_core::status::{PipelineStatus, PipelineStatusDesc};
use gantry_core::{Kind, Name};

use crate::error::ExecutorResult;
use crate::types::{ActionExecutor, TaskPromise};

pub const KIND: &str = "MEMORY";

/// Executor that simulates task progress in memory
pub struct MemoryExecutor {
    kind: Kind,
    name: Name,
    progress: RwLock<HashMap<String, u8>>,
}

impl MemoryExecutor {
    pub fn new(name: Name, _options: &HashMap<String, String>) -> anyhow::Result<Self> {
        Ok(Self {
            kind: Kind::new(KIND)?,
            name,
            progress: RwLock::new(HashMap::new()),
        })
    }
}

#[async_trait]
impl ActionExecutor for MemoryExecutor {
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
        let mut progress = self.progress.write().await;
        let step = progress.entry(task.extra.uuid.clone()).or_insert(0);
        let status = match *step {
            0 => PipelineStatus::Created,
            1 => PipelineStatus::Running,
            _ => PipelineStatus::Success,
        };
        *step = step.saturating_add(1);
        Ok(PipelineStatusDesc::new(status, ""))
    }

    async fn cancel(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }

    /// Forgets the task so a rerun starts from the beginning
    async fn remove(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.progress.write().await.remove(&task.extra.uuid);
        Ok(Value::Null)
    }
}
