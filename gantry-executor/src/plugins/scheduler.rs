//! HTTP job-scheduler backend
//!
//! Proxies the task lifecycle to the scheduler control-plane service. The
//! scheduler reports request-level failures as an `error` string inside
//! HTTP 200 envelopes, so every reply is inspected here rather than at the
//! transport layer. Recognized "already exists" and "job is running"
//! replies are folded into idempotent successes.

use std::collections::HashMap;

use anyhow::bail;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use gantry_client::SchedulerClient;
use gantry_core::domain::task::PipelineTask;
use gantry_core::dto::job::{JobIdentity, JobSpec};
use gantry_core::status::PipelineStatusDesc;
use gantry_core::{Kind, Name};

use crate::error::{ExecutorError, ExecutorResult};
use crate::transfer::transfer_status;
use crate::types::{ActionExecutor, TaskPromise};

pub const KIND: &str = "SCHEDULER";

/// Options key carrying the scheduler base URL
pub const OPTION_ADDR: &str = "ADDR";

/// Environment override for the scheduler address; when set it wins over
/// the per-instance options of every configured scheduler executor
const ENV_ADDR: &str = "SCHEDULER_ADDR";

/// Marker substring in delete replies for jobs that are already gone
const NOT_FOUND: &str = "not found";

/// Recognizes scheduler errors that mean the requested effect already holds
///
/// The scheduler embeds backend API errors as escaped JSON inside its own
/// `error` string, so the message is unescaped before matching. A 409 with
/// reason `AlreadyExists`, or any "job is running" flavor, means a repeated
/// `create`/`start` hit an existing unit.
fn is_job_idempotent_err_msg(msg: &str) -> bool {
    let unescaped = msg
        .replace("\\\\", "\\")
        .replace("\\\"", "\"")
        .replace("\\'", "'");
    if unescaped.contains(r#""code":409"#) && unescaped.contains(r#""reason":"AlreadyExists""#) {
        return true;
    }
    unescaped.to_lowercase().contains("job is running")
}

/// Executor that delegates jobs to the HTTP scheduler service
pub struct SchedulerExecutor {
    kind: Kind,
    name: Name,
    client: SchedulerClient,
}

impl SchedulerExecutor {
    pub fn new(name: Name, options: &HashMap<String, String>) -> anyhow::Result<Self> {
        let mut addr = options.get(OPTION_ADDR).cloned().unwrap_or_default();
        if let Some(env_addr) = std::env::var(ENV_ADDR).ok().filter(|v| !v.is_empty()) {
            info!(
                "scheduler executor {} takes addr from {} instead of options",
                name, ENV_ADDR
            );
            addr = env_addr;
        }
        if addr.is_empty() {
            bail!("scheduler executor {} requires option {}", name, OPTION_ADDR);
        }
        Ok(Self {
            kind: Kind::new(KIND)?,
            name,
            client: SchedulerClient::new(&addr),
        })
    }

    /// A task must carry the namespace/UUID pair addressing its remote job
    fn validate(&self, task: &PipelineTask) -> ExecutorResult<()> {
        if task.extra.namespace.is_empty() {
            return Err(ExecutorError::MissingNamespace);
        }
        if task.extra.uuid.is_empty() {
            return Err(ExecutorError::MissingUuid);
        }
        Ok(())
    }
}

#[async_trait]
impl ActionExecutor for SchedulerExecutor {
    fn kind(&self) -> Kind {
        self.kind.clone()
    }

    fn name(&self) -> Name {
        self.name.clone()
    }

    async fn create(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.validate(task)?;
        let existence = self.exist(task).await?;
        if existence.created {
            warn!("job already created, skip create, task {}", task.id);
            return Ok(Value::Null);
        }

        let job = JobSpec::from(task);
        let reply = self.client.create_job(&job).await?;
        if !reply.error.is_empty() {
            if !is_job_idempotent_err_msg(&reply.error) {
                return Err(ExecutorError::Reply(reply.error));
            }
            warn!(
                "job already exists, take create as success, task {}: {}",
                task.id, reply.error
            );
        }
        Ok(serde_json::to_value(job)?)
    }

    async fn start(&self, task: &PipelineTask, _promise: TaskPromise) -> ExecutorResult<Value> {
        self.validate(task)?;
        let existence = self.exist(task).await?;
        if !existence.created {
            warn!("job not created yet, create before start, task {}", task.id);
            self.create(task).await?;
        }
        if existence.started {
            warn!("job already started, skip start, task {}", task.id);
            return Ok(Value::Null);
        }

        let reply = self
            .client
            .start_job(&task.extra.namespace, &task.job_id())
            .await?;
        if !reply.error.is_empty() {
            if !is_job_idempotent_err_msg(&reply.error) {
                return Err(ExecutorError::Reply(reply.error));
            }
            warn!(
                "job already running, take start as success, task {}: {}",
                task.id, reply.error
            );
        }
        match reply.job {
            Some(job) => Ok(serde_json::to_value(job)?),
            None => Ok(Value::Null),
        }
    }

    async fn status(&self, task: &PipelineTask) -> ExecutorResult<PipelineStatusDesc> {
        self.validate(task)?;
        let raw = self
            .client
            .job_status(&task.extra.namespace, &task.job_id())
            .await?;
        if raw.status.is_empty() {
            return Err(ExecutorError::EmptyStatus {
                last_message: raw.last_message,
            });
        }

        let status = transfer_status(&raw.status);
        debug!(
            "scheduler status for task {}: {} -> {}",
            task.id, raw.status, status
        );
        Ok(PipelineStatusDesc::new(status, raw.last_message))
    }

    async fn cancel(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.validate(task)?;
        let reply = self
            .client
            .stop_job(&task.extra.namespace, &task.job_id())
            .await?;
        if !reply.error.is_empty() {
            return Err(ExecutorError::Reply(reply.error));
        }
        Ok(Value::String(reply.name))
    }

    async fn remove(&self, task: &PipelineTask) -> ExecutorResult<Value> {
        self.validate(task)?;
        let reply = self
            .client
            .delete_job(&task.extra.namespace, &task.job_id())
            .await?;
        if !reply.error.is_empty() {
            if !reply.error.contains(NOT_FOUND) {
                return Err(ExecutorError::Reply(reply.error));
            }
            warn!(
                "job already gone on delete, task {}: {}",
                task.id, reply.error
            );
        }
        Ok(Value::String(reply.name))
    }

    /// One scheduler round-trip for the whole batch
    ///
    /// The scheduler answers per job; jobs it no longer knows are skipped
    /// and any other per-job error fails the batch after all replies have
    /// been read.
    async fn batch_delete(&self, tasks: &[PipelineTask]) -> ExecutorResult<Value> {
        let jobs: Vec<JobIdentity> = tasks
            .iter()
            .filter(|task| !task.extra.uuid.is_empty())
            .map(JobIdentity::from)
            .collect();
        if jobs.is_empty() {
            return Ok(Value::Null);
        }

        let replies = self.client.delete_jobs(&jobs).await?;
        let mut failures = Vec::new();
        for reply in replies {
            if reply.error.is_empty() {
                continue;
            }
            if reply.error.contains(NOT_FOUND) {
                warn!(
                    "skip delete of missing job {}/{}: {}",
                    reply.namespace, reply.name, reply.error
                );
                continue;
            }
            failures.push(format!(
                "job {}/{}: {}",
                reply.namespace, reply.name, reply.error
            ));
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
