//! Pipeline stage domain types

use serde::{Deserialize, Serialize};

use crate::status::PipelineStatus;

/// One sequential step of a pipeline
///
/// Stages run strictly in order; the tasks inside one stage run
/// concurrently, and the stage completes only when all of them reach an end
/// status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStage {
    pub id: u64,
    pub pipeline_id: u64,
    pub status: PipelineStatus,
}
