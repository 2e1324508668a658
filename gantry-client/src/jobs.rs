//! Job lifecycle endpoints

use crate::SchedulerClient;
use crate::error::Result;
use gantry_core::dto::job::{JobIdentity, JobOpResponse, JobResultResponse, JobSpec, StatusDesc};
use tracing::debug;

impl SchedulerClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Submit a job definition to the scheduler
    ///
    /// Creation registers the job in the scheduler's store without starting
    /// the workload. The reply's `error` carries scheduler-level failures
    /// (including "already exists", which callers treat as success).
    pub async fn create_job(&self, job: &JobSpec) -> Result<JobResultResponse> {
        let url = format!("{}/v1/job/create", self.base_url);
        let response = self.client.put(&url).json(job).send().await?;

        let reply: JobResultResponse = self.handle_response(response).await?;
        debug!(
            "scheduler create reply, name: {}, error: {:?}",
            reply.name, reply.error
        );
        Ok(reply)
    }

    /// Start a previously created job
    pub async fn start_job(&self, namespace: &str, job_id: &str) -> Result<JobResultResponse> {
        let url = format!("{}/v1/job/{}/{}/start", self.base_url, namespace, job_id);
        let response = self.client.post(&url).send().await?;

        let reply: JobResultResponse = self.handle_response(response).await?;
        debug!(
            "scheduler start reply, name: {}, error: {:?}",
            reply.name, reply.error
        );
        Ok(reply)
    }

    /// Fetch the scheduler's raw status report for a job
    ///
    /// An empty `status` field in the reply means the scheduler had no
    /// answer; `last_message` then explains why.
    pub async fn job_status(&self, namespace: &str, job_id: &str) -> Result<StatusDesc> {
        let url = format!("{}/v1/job/{}/{}", self.base_url, namespace, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Stop a running job, leaving its record in place
    pub async fn stop_job(&self, namespace: &str, job_id: &str) -> Result<JobOpResponse> {
        let url = format!("{}/v1/job/{}/{}/stop", self.base_url, namespace, job_id);
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }

    /// Delete a single job record and its workload
    pub async fn delete_job(&self, namespace: &str, job_id: &str) -> Result<JobOpResponse> {
        let url = format!("{}/v1/job/{}/{}/delete", self.base_url, namespace, job_id);
        let response = self.client.delete(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Batch Operations
    // =============================================================================

    /// Delete a batch of jobs in one call
    ///
    /// The scheduler replies with one envelope per job; each may carry its
    /// own `error` and the call as a whole can still be HTTP 200.
    pub async fn delete_jobs(&self, jobs: &[JobIdentity]) -> Result<Vec<JobOpResponse>> {
        let url = format!("{}/v1/jobs", self.base_url);
        let response = self.client.delete(&url).json(&jobs).send().await?;

        let replies: Vec<JobOpResponse> = self.handle_response(response).await?;
        debug!("scheduler batch delete replied for {} job(s)", replies.len());
        Ok(replies)
    }
}
