//! Job DTOs for the scheduler control-plane API

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::task::PipelineTask;

/// Job definition submitted on create
///
/// The scheduler keys jobs by `(namespace, name)`; `name` is the task's
/// remote job id so that repeated submissions address the same job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "clusterName")]
    pub cluster_name: String,
    pub image: String,
    pub cmd: String,
    pub cpu: f64,
    pub memory: f64,
    pub env: HashMap<String, String>,
    pub volumes: Vec<JobVolume>,
}

impl From<&PipelineTask> for JobSpec {
    fn from(task: &PipelineTask) -> Self {
        let mut env = task.extra.public_envs.clone();
        // private values win on key collision
        env.extend(task.extra.private_envs.clone());
        Self {
            name: task.job_id(),
            namespace: task.extra.namespace.clone(),
            cluster_name: task.extra.cluster_name.clone(),
            image: task.extra.image.clone().unwrap_or_default(),
            cmd: task.extra.cmd.clone().unwrap_or_default(),
            cpu: task.extra.applied_resources.limits.cpu,
            memory: task.extra.applied_resources.limits.memory_mb,
            env,
            volumes: task.extra.volumes.iter().map(JobVolume::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobVolume {
    pub name: String,
    #[serde(rename = "containerPath")]
    pub container_path: String,
    #[serde(rename = "readOnly")]
    pub read_only: bool,
}

impl From<&crate::domain::task::TaskVolume> for JobVolume {
    fn from(volume: &crate::domain::task::TaskVolume) -> Self {
        Self {
            name: volume.name.clone(),
            container_path: volume.container_path.clone(),
            read_only: volume.read_only,
        }
    }
}

/// Identity triple used by batch deletion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobIdentity {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "clusterName")]
    pub cluster_name: String,
    pub volumes: Vec<JobVolume>,
}

impl From<&PipelineTask> for JobIdentity {
    fn from(task: &PipelineTask) -> Self {
        Self {
            name: task.extra.uuid.clone(),
            namespace: task.extra.namespace.clone(),
            cluster_name: task.extra.cluster_name.clone(),
            volumes: task.extra.volumes.iter().map(JobVolume::from).collect(),
        }
    }
}

/// Raw status report for one job
///
/// `status` is the scheduler's own vocabulary, translated by the executor.
/// An empty `status` means the scheduler could not produce one and
/// `last_message` explains why (including the "not found" case).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusDesc {
    pub status: String,
    pub last_message: String,
}

/// Envelope for create and start replies
///
/// The scheduler reports request-level failures in `error` with HTTP 200;
/// an empty string means success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobResultResponse {
    pub name: String,
    pub error: String,
    pub job: Option<JobSpec>,
}

/// Envelope for stop, delete and batch-delete replies
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobOpResponse {
    pub name: String,
    pub namespace: String,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::{AppliedResource, TaskVolume};

    #[test]
    fn test_job_spec_from_task() {
        let mut task = PipelineTask::default();
        task.extra.uuid = "u42".to_string();
        task.extra.namespace = "pipeline-1".to_string();
        task.extra.cluster_name = "terminus-dev".to_string();
        task.extra.image = Some("registry/worker:1".to_string());
        task.extra.applied_resources.limits = AppliedResource {
            cpu: 0.5,
            memory_mb: 2048.0,
        };
        task.extra
            .public_envs
            .insert("MODE".to_string(), "public".to_string());
        task.extra
            .private_envs
            .insert("MODE".to_string(), "private".to_string());
        task.extra.volumes.push(TaskVolume {
            name: "ctx".to_string(),
            container_path: "/ctx".to_string(),
            read_only: false,
        });

        let job = JobSpec::from(&task);
        assert_eq!(job.name, "u42");
        assert_eq!(job.namespace, "pipeline-1");
        assert_eq!(job.cpu, 0.5);
        assert_eq!(job.memory, 2048.0);
        assert_eq!(job.env.get("MODE").map(String::as_str), Some("private"));
        assert_eq!(job.volumes.len(), 1);
    }

    #[test]
    fn test_envelope_defaults_tolerate_sparse_json() {
        let resp: JobResultResponse = serde_json::from_str(r#"{"name":"u42"}"#).unwrap();
        assert_eq!(resp.name, "u42");
        assert!(resp.error.is_empty());
        assert!(resp.job.is_none());

        let desc: StatusDesc =
            serde_json::from_str(r#"{"last_message":"failed to inspect job, err: not found"}"#)
                .unwrap();
        assert!(desc.status.is_empty());
    }
}
