//! Pipeline task domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::identity::{Kind, Name};
use crate::status::PipelineStatus;

/// One executable unit of a stage
///
/// A task is handed to the executor selected by `executor_kind` +
/// `executor_name` and driven through create/start/status until terminal.
/// `cost_time_sec`/`queue_time_sec` stay `-1` until finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTask {
    pub id: u64,
    pub pipeline_id: u64,
    pub stage_id: u64,
    pub name: String,
    /// Action type from the definition (e.g. "buildpack", "release", "wait")
    pub action_type: String,
    pub executor_kind: Kind,
    pub executor_name: Name,
    pub status: PipelineStatus,
    pub cost_time_sec: i64,
    pub queue_time_sec: i64,
    pub time_begin: Option<DateTime<Utc>>,
    pub time_end: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
    pub extra: TaskExtra,
    pub result: Option<TaskResult>,
}

impl PipelineTask {
    /// Identity of the remote workload for this task
    ///
    /// Deterministic so that repeated create/start calls address the same
    /// backend object. Looped reruns get a distinct suffix per iteration.
    pub fn job_id(&self) -> String {
        match &self.extra.loop_options {
            Some(opts) if opts.looped_times > 0 => {
                format!("{}-loop-{}", self.extra.uuid, opts.looped_times)
            }
            _ => self.extra.uuid.clone(),
        }
    }
}

/// Generates a task uuid in the canonical `u<32 hex>` form
pub fn generate_task_uuid() -> String {
    format!("u{}", Uuid::new_v4().simple())
}

/// Executor-facing details of a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskExtra {
    pub namespace: String,
    #[serde(rename = "UUID")]
    pub uuid: String,
    pub cluster_name: String,
    pub image: Option<String>,
    pub cmd: Option<String>,
    pub public_envs: HashMap<String, String>,
    pub private_envs: HashMap<String, String>,
    /// Raw action params from the definition, untouched by the engine
    pub action_params: HashMap<String, serde_json::Value>,
    pub applied_resources: AppliedResources,
    pub volumes: Vec<TaskVolume>,
    pub loop_options: Option<TaskLoopOptions>,
    pub time_begin_queue: Option<DateTime<Utc>>,
    pub time_end_queue: Option<DateTime<Utc>>,
    /// The namespace is shared with workloads outside this pipeline and
    /// must not be deleted during cleanup
    pub not_pipeline_controlled_ns: bool,
}

/// Volume attached to the task's container
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskVolume {
    pub name: String,
    pub container_path: String,
    pub read_only: bool,
}

/// Loop state for tasks that re-run on a break condition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskLoopOptions {
    pub strategy: Option<LoopStrategy>,
    /// How many times the task has already looped
    pub looped_times: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopStrategy {
    pub max_times: i64,
    pub interval_sec: u64,
    pub decline_ratio: f64,
    pub decline_limit_sec: i64,
}

/// CPU/memory envelope applied to one task or aggregated to a pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedResource {
    pub cpu: f64,
    #[serde(rename = "memoryMB")]
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedResources {
    pub limits: AppliedResource,
    pub requests: AppliedResource,
}

/// Outcome payload written by executors that run work synchronously
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskResult {
    pub metadata: Vec<MetadataField>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataField {
    pub name: String,
    pub value: String,
}

/// Diagnostic details for a task, assembled on demand by `inspect`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskInspect {
    pub desc: String,
    pub events: String,
}

impl Default for PipelineTask {
    fn default() -> Self {
        Self {
            id: 0,
            pipeline_id: 0,
            stage_id: 0,
            name: String::new(),
            action_type: String::new(),
            executor_kind: Kind::default(),
            executor_name: Name::default(),
            status: PipelineStatus::Analyzed,
            cost_time_sec: -1,
            queue_time_sec: -1,
            time_begin: None,
            time_end: None,
            time_updated: None,
            extra: TaskExtra::default(),
            result: None,
        }
    }
}
