//! Allowed-action predicates for pipelines
//!
//! Pure functions of pipeline, optional cron, and (for reruns) the source
//! pipeline. Display layers call these instead of re-deriving rules from
//! raw status fields.

use serde::{Deserialize, Serialize};

use crate::domain::cron::PipelineCron;
use crate::domain::pipeline::{Pipeline, PipelineType};
use crate::status::PipelineStatus;

/// Whether a pipeline may be started by hand right now
///
/// Only freshly analyzed pipelines qualify, and never when precheck
/// stored an abort verdict. A rerun-failed pipeline additionally needs
/// its source pipeline to still be around (not yet garbage-collected),
/// since the rerun copies task state from it.
pub fn can_manual_run(pipeline: &Pipeline, rerun_source: Option<&Pipeline>) -> bool {
    if pipeline.status != PipelineStatus::Analyzed {
        return false;
    }
    if pipeline
        .extra
        .show_message
        .as_ref()
        .is_some_and(|m| m.abort_run)
    {
        return false;
    }
    if pipeline.pipeline_type == PipelineType::RerunFailed {
        return match rerun_source {
            Some(source) => !source.extra.complete_reconciler_gc,
            None => false,
        };
    }
    true
}

pub fn can_cancel(pipeline: &Pipeline) -> bool {
    pipeline.status.is_reconciler_running_status()
}

/// Unimplemented upstream; kept so callers see an explicit denial
pub fn can_force_cancel(_pipeline: &Pipeline) -> bool {
    false
}

/// Unimplemented upstream; kept so callers see an explicit denial
pub fn can_pause(_pipeline: &Pipeline) -> bool {
    false
}

pub fn can_unpause(pipeline: &Pipeline) -> bool {
    pipeline.status.can_unpause()
}

pub fn can_rerun(pipeline: &Pipeline) -> bool {
    pipeline.status.is_end_status()
}

/// Failed pipelines can be partially rerun until GC reclaims their tasks
pub fn can_rerun_failed(pipeline: &Pipeline) -> bool {
    pipeline.status.is_failed_status() && !pipeline.extra.complete_reconciler_gc
}

pub fn can_start_cron(cron: Option<&PipelineCron>) -> bool {
    matches!(cron, Some(c) if c.enable == Some(false))
}

pub fn can_stop_cron(cron: Option<&PipelineCron>) -> bool {
    matches!(cron, Some(c) if c.enable == Some(true))
}

/// Deletion verdict with a user-facing reason on denial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCapability {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl DeleteCapability {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

pub fn can_delete(pipeline: &Pipeline) -> DeleteCapability {
    if !pipeline.status.can_delete() {
        return DeleteCapability::denied(format!("invalid status: {}", pipeline.status));
    }
    // terminal pipelines stay referenced by reconciler bookkeeping until
    // GC has run
    if pipeline.status.is_end_status() && !pipeline.extra.complete_reconciler_gc {
        return DeleteCapability::denied("waiting gc");
    }
    DeleteCapability::allowed()
}

/// Every capability evaluated at once, for detail views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCapabilities {
    pub can_manual_run: bool,
    pub can_cancel: bool,
    pub can_force_cancel: bool,
    pub can_rerun: bool,
    pub can_rerun_failed: bool,
    pub can_start_cron: bool,
    pub can_stop_cron: bool,
    pub can_pause: bool,
    pub can_unpause: bool,
    pub can_delete: bool,
    pub can_delete_reason: Option<String>,
}

pub fn capabilities(
    pipeline: &Pipeline,
    cron: Option<&PipelineCron>,
    rerun_source: Option<&Pipeline>,
) -> PipelineCapabilities {
    let delete = can_delete(pipeline);
    PipelineCapabilities {
        can_manual_run: can_manual_run(pipeline, rerun_source),
        can_cancel: can_cancel(pipeline),
        can_force_cancel: can_force_cancel(pipeline),
        can_rerun: can_rerun(pipeline),
        can_rerun_failed: can_rerun_failed(pipeline),
        can_start_cron: can_start_cron(cron),
        can_stop_cron: can_stop_cron(cron),
        can_pause: can_pause(pipeline),
        can_unpause: can_unpause(pipeline),
        can_delete: delete.allowed,
        can_delete_reason: delete.reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pipeline::{RerunFailedDetail, ShowMessage};

    fn pipeline_with_status(status: PipelineStatus) -> Pipeline {
        Pipeline {
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_can_manual_run_only_when_analyzed() {
        assert!(can_manual_run(
            &pipeline_with_status(PipelineStatus::Analyzed),
            None
        ));
        assert!(!can_manual_run(
            &pipeline_with_status(PipelineStatus::Running),
            None
        ));
    }

    #[test]
    fn test_can_manual_run_blocked_by_precheck_abort() {
        let mut pipeline = pipeline_with_status(PipelineStatus::Analyzed);
        pipeline.extra.show_message = Some(ShowMessage {
            msg: "precheck failed".to_string(),
            stacks: vec![],
            abort_run: true,
        });
        assert!(!can_manual_run(&pipeline, None));
    }

    #[test]
    fn test_can_manual_run_rerun_failed_needs_live_source() {
        let mut pipeline = pipeline_with_status(PipelineStatus::Analyzed);
        pipeline.pipeline_type = PipelineType::RerunFailed;
        pipeline.extra.rerun_failed_detail = Some(RerunFailedDetail {
            rerun_pipeline_id: 7,
        });

        assert!(!can_manual_run(&pipeline, None));

        let mut source = pipeline_with_status(PipelineStatus::Failed);
        assert!(can_manual_run(&pipeline, Some(&source)));

        source.extra.complete_reconciler_gc = true;
        assert!(!can_manual_run(&pipeline, Some(&source)));
    }

    #[test]
    fn test_can_rerun_failed_until_gc() {
        let mut pipeline = pipeline_with_status(PipelineStatus::Failed);
        assert!(can_rerun_failed(&pipeline));

        pipeline.extra.complete_reconciler_gc = true;
        assert!(!can_rerun_failed(&pipeline));

        assert!(!can_rerun_failed(&pipeline_with_status(
            PipelineStatus::Success
        )));
    }

    #[test]
    fn test_cron_capabilities() {
        let mut cron = PipelineCron::default();
        assert!(!can_start_cron(Some(&cron)));
        assert!(!can_stop_cron(Some(&cron)));

        cron.enable = Some(false);
        assert!(can_start_cron(Some(&cron)));
        assert!(!can_stop_cron(Some(&cron)));

        cron.enable = Some(true);
        assert!(!can_start_cron(Some(&cron)));
        assert!(can_stop_cron(Some(&cron)));

        assert!(!can_start_cron(None));
        assert!(!can_stop_cron(None));
    }

    #[test]
    fn test_can_delete_reasons() {
        let running = pipeline_with_status(PipelineStatus::Running);
        let verdict = can_delete(&running);
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason.as_deref(), Some("invalid status: Running"));

        let mut finished = pipeline_with_status(PipelineStatus::Success);
        let verdict = can_delete(&finished);
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason.as_deref(), Some("waiting gc"));

        finished.extra.complete_reconciler_gc = true;
        assert!(can_delete(&finished).allowed);

        // analyzed pipelines never ran, no gc to wait for
        assert!(can_delete(&pipeline_with_status(PipelineStatus::Analyzed)).allowed);
    }

    #[test]
    fn test_capability_bundle() {
        let mut pipeline = pipeline_with_status(PipelineStatus::Failed);
        pipeline.extra.complete_reconciler_gc = true;
        let caps = capabilities(&pipeline, None, None);
        assert!(caps.can_rerun);
        assert!(!caps.can_rerun_failed);
        assert!(!caps.can_force_cancel);
        assert!(!caps.can_pause);
        assert!(caps.can_delete);
    }
}
