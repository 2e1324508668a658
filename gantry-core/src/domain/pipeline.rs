//! Pipeline domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::PipelineStatus;

/// A single pipeline run
///
/// Created on submission after precheck, then mutated by the reconciler as
/// stages progress. Timestamps are `None` until the corresponding event
/// happened; `cost_time_sec` stays `-1` until finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: u64,
    pub status: PipelineStatus,
    pub cluster_name: String,
    pub trigger_mode: TriggerMode,
    pub cron_id: Option<u64>,
    #[serde(rename = "type")]
    pub pipeline_type: PipelineType,
    pub cost_time_sec: i64,
    pub time_created: Option<DateTime<Utc>>,
    pub time_begin: Option<DateTime<Utc>>,
    pub time_end: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
    pub extra: PipelineExtra,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self {
            id: 0,
            status: PipelineStatus::Analyzed,
            cluster_name: String::new(),
            trigger_mode: TriggerMode::Manual,
            cron_id: None,
            pipeline_type: PipelineType::Normal,
            cost_time_sec: -1,
            time_created: None,
            time_begin: None,
            time_end: None,
            time_updated: None,
            extra: PipelineExtra::default(),
        }
    }
}

/// How the run was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    Manual,
    Cron,
}

/// Relationship of this run to earlier runs of the same definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineType {
    Normal,
    Rerun,
    RerunFailed,
}

/// Bookkeeping that rides along with a pipeline record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineExtra {
    pub namespace: String,
    pub cron_trigger_time: Option<DateTime<Utc>>,
    /// Set once the reconciler has garbage-collected all task resources
    pub complete_reconciler_gc: bool,
    pub rerun_failed_detail: Option<RerunFailedDetail>,
    /// Stored precheck outcome, shown to the user on the run page
    pub show_message: Option<ShowMessage>,
}

/// Lineage of a rerun-failed pipeline back to the run it repairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RerunFailedDetail {
    pub rerun_pipeline_id: u64,
}

/// Precheck verdict persisted with the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowMessage {
    pub msg: String,
    pub stacks: Vec<String>,
    /// True when precheck decided the run must not start
    pub abort_run: bool,
}
