//! Backend status vocabulary and its translation
//!
//! Job backends report a small fixed set of status strings. `transfer_status`
//! folds them into the shared `PipelineStatus` model; anything unrecognized
//! maps to `Unknown` so a backend upgrade can never invent an engine state.

use gantry_core::status::PipelineStatus;

/// Status strings reported by job backends
pub mod job_status {
    pub const ERROR: &str = "Error";
    pub const UNKNOWN: &str = "Unknown";
    pub const CREATED: &str = "Created";
    pub const UNSCHEDULABLE: &str = "Unschedulable";
    pub const RUNNING: &str = "Running";
    pub const STOPPED_ON_OK: &str = "StoppedOnOK";
    pub const FINISHED: &str = "Finished";
    pub const STOPPED_ON_FAILED: &str = "StoppedOnFailed";
    pub const FAILED: &str = "Failed";
    pub const STOPPED_BY_KILLED: &str = "StoppedByKilled";
    pub const NOT_FOUND_IN_CLUSTER: &str = "NotFoundInCluster";

    /// Legacy aliases still emitted by older backends
    pub const INITIAL: &str = "INITIAL";
    pub const ACTIVE: &str = "ACTIVE";
}

/// Translates a backend job status into the pipeline status model
///
/// `NotFoundInCluster` becomes `StartError` here: when a status poll (rather
/// than an existence probe) discovers the unit is gone, the task was started
/// on a record that never materialized into a workload.
pub fn transfer_status(status: &str) -> PipelineStatus {
    match status {
        job_status::ERROR => PipelineStatus::Error,
        job_status::UNKNOWN => PipelineStatus::Unknown,
        job_status::CREATED => PipelineStatus::Created,
        job_status::UNSCHEDULABLE | job_status::INITIAL => PipelineStatus::Queue,
        job_status::RUNNING | job_status::ACTIVE => PipelineStatus::Running,
        job_status::STOPPED_ON_OK | job_status::FINISHED => PipelineStatus::Success,
        job_status::STOPPED_ON_FAILED | job_status::FAILED => PipelineStatus::Failed,
        job_status::STOPPED_BY_KILLED => PipelineStatus::StopByUser,
        job_status::NOT_FOUND_IN_CLUSTER => PipelineStatus::StartError,
        _ => PipelineStatus::Unknown,
    }
}
