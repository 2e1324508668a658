//! In-process timer backend
//!
//! A wait task succeeds once its configured duration has elapsed since
//! `time_begin`. There is no remote unit: `start` spawns a timer that
//! resolves the task promise, and `status` recomputes the answer from
//! timestamps so a restarted reconciler can pick the task back up.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::time::sleep;

use gantry_core::domain::task::PipelineTask;
use gantry_core::status::{PipelineStatus, PipelineStatusDesc};
use gantry_core::{Kind, Name};

use crate::error::{ExecutorError, ExecutorResult};
use crate::types::{ActionExecutor, TaskPromise};

pub const KIND: &str = "WAIT";

/// Task env var holding the wait duration in seconds
pub const ENV_WAIT_TIME_SEC: &str = "ACTION_WAIT_TIME_SEC";

/// Legacy name for the same setting, read when the current one is unset
pub const ENV_WAIT_TIME: &str = "ACTION_WAIT_TIME";

fn lookup_env(task: &PipelineTask, key: &str) -> Option<String> {
    task.extra
        .private_envs
        .get(key)
        .or_else(|| task.extra.public_envs.get(key))
        .cloned()
}

/// Reads and validates the wait duration from the task's env vars
fn wait_duration_sec(task: &PipelineTask) -> ExecutorResult<i64> {
    let raw = lookup_env(task, ENV_WAIT_TIME_SEC).or_else(|| lookup_env(task, ENV_WAIT_TIME));
    let Some(raw) = raw else {
        return Err(ExecutorError::InvalidSpec(format!(
            "wait task needs env {} (or legacy {})",
            ENV_WAIT_TIME_SEC, ENV_WAIT_TIME
        )));
    };
    let sec: i64 = raw.trim().parse().map_err(|_| {
        ExecutorError::InvalidSpec(format!(
            "invalid wait duration {:?}, want whole seconds",
            raw
        ))
    })?;
    if sec <= 0 {
        return Err(ExecutorError::InvalidSpec(format!(
            "wait duration must be positive, got {}",
            sec
        )));
    }
    Ok(sec)
}

/// Executor that completes tasks by waiting out a duration
pub struct WaitExecutor {
    kind: Kind,
    name: Name,
}

impl WaitExecutor {
    pub fn new(name: Name, _options: &HashMap<String, String>) -> anyhow::Result<Self> {
        Ok(Self {
            kind: Kind::new(KIND)?,
            name,
        })
    }
}

#[async_trait]
impl ActionExecutor for WaitExecutor {
    fn kind(&self) -> Kind {
        self.kind.clone()
    }

    fn name(&self) -> Name {
        self.name.clone()
    }

    async fn create(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        // validate early so a bad duration aborts before start
        wait_duration_sec(task)?;
        Ok(Value::Null)
    }

    async fn start(&self, task: &PipelineTask, promise: TaskPromise) -> ExecutorResult<Value> {
        let sec = wait_duration_sec(task)?;
        let begin = task.time_begin.unwrap_or_else(Utc::now);
        let deadline = begin + chrono::Duration::seconds(sec);
        let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        let mut promise = promise;
        tokio::spawn(async move {
            let resolved = tokio::select! {
                _ = sleep(remaining) => PipelineStatusDesc::new(
                    PipelineStatus::Success,
                    format!("waited {} second(s)", sec),
                ),
                _ = promise.cancelled() => {
                    PipelineStatusDesc::new(PipelineStatus::StopByUser, "wait cancelled")
                }
            };
            promise.resolve(resolved);
        });
        Ok(Value::Null)
    }

    /// Recomputed from timestamps, so polling works even if the timer
    /// task from `start` is gone (e.g. after a process restart)
    async fn status(&self, task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc> {
        let sec = wait_duration_sec(task)?;
        let Some(begin) = task.time_begin else {
            return Ok(PipelineStatusDesc::new(PipelineStatus::Analyzed, ""));
        };
        if Utc::now() >= begin + chrono::Duration::seconds(sec) {
            return Ok(PipelineStatusDesc::new(
                PipelineStatus::Success,
                format!("waited {} second(s)", sec),
            ));
        }
        Ok(PipelineStatusDesc::new(PipelineStatus::Running, ""))
    }

    async fn cancel(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }

    async fn remove(&self, _task: &PipelineTask) -> ExecutorResult<Value> {
        Ok(Value::Null)
    }
}
