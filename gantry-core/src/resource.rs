//! Pipeline-level resource aggregation
//!
//! Tasks arrive grouped by stage (outer slice = stages in order, inner
//! slice = that stage's tasks). Tasks inside a stage run concurrently
//! while stages run one after another, which gives the two aggregates
//! different shapes:
//!
//! - limits: sum per stage, then max across stages (peak concurrent use)
//! - requests: single max task value across the whole pipeline (a request
//!   is a per-task scheduling guarantee, not a concurrency bound)

use crate::domain::task::{AppliedResource, AppliedResources, PipelineTask};

/// Peak concurrent CPU/memory envelope across all stages
pub fn calculate_pipeline_limit_resource(stages: &[Vec<AppliedResource>]) -> AppliedResource {
    let mut max = AppliedResource::default();
    for stage in stages {
        let mut sum = AppliedResource::default();
        for task in stage {
            sum.cpu += task.cpu;
            sum.memory_mb += task.memory_mb;
        }
        // dimensions peak independently, possibly in different stages
        max.cpu = max.cpu.max(sum.cpu);
        max.memory_mb = max.memory_mb.max(sum.memory_mb);
    }
    max
}

/// Largest single-task CPU/memory request anywhere in the pipeline
pub fn calculate_pipeline_request_resource(stages: &[Vec<AppliedResource>]) -> AppliedResource {
    let mut max = AppliedResource::default();
    for task in stages.iter().flatten() {
        max.cpu = max.cpu.max(task.cpu);
        max.memory_mb = max.memory_mb.max(task.memory_mb);
    }
    max
}

/// Aggregates both envelopes from tasks already grouped by stage
pub fn calculate_pipeline_resources(stage_tasks: &[Vec<PipelineTask>]) -> AppliedResources {
    let limits: Vec<Vec<AppliedResource>> = stage_tasks
        .iter()
        .map(|stage| stage.iter().map(|t| t.extra.applied_resources.limits).collect())
        .collect();
    let requests: Vec<Vec<AppliedResource>> = stage_tasks
        .iter()
        .map(|stage| stage.iter().map(|t| t.extra.applied_resources.requests).collect())
        .collect();
    AppliedResources {
        limits: calculate_pipeline_limit_resource(&limits),
        requests: calculate_pipeline_request_resource(&requests),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(cpu: f64, memory_mb: f64) -> AppliedResource {
        AppliedResource { cpu, memory_mb }
    }

    #[test]
    fn test_limit_is_max_of_stage_sums() {
        let stages = vec![
            vec![res(1.0, 5.0), res(2.0, 4.0)],
            vec![res(2.0, 1.0), res(3.0, 3.0)],
            vec![res(4.0, 8.0)],
        ];
        let limit = calculate_pipeline_limit_resource(&stages);
        assert_eq!(limit.cpu, 5.0);
        assert_eq!(limit.memory_mb, 9.0);
    }

    #[test]
    fn test_request_is_single_max_task() {
        let stages = vec![
            vec![res(1.0, 5.0), res(2.0, 4.0)],
            vec![res(2.0, 4.0), res(4.0, 1.0)],
            vec![res(4.0, 7.0)],
        ];
        let request = calculate_pipeline_request_resource(&stages);
        assert_eq!(request.cpu, 4.0);
        assert_eq!(request.memory_mb, 7.0);
    }

    #[test]
    fn test_empty_pipeline_is_zero() {
        let limit = calculate_pipeline_limit_resource(&[]);
        assert_eq!(limit, AppliedResource::default());
        let request = calculate_pipeline_request_resource(&[]);
        assert_eq!(request, AppliedResource::default());
    }

    #[test]
    fn test_task_level_aggregation() {
        let mut heavy = PipelineTask::default();
        heavy.extra.applied_resources = AppliedResources {
            limits: res(2.0, 2048.0),
            requests: res(1.0, 1024.0),
        };
        let mut light = PipelineTask::default();
        light.extra.applied_resources = AppliedResources {
            limits: res(0.5, 512.0),
            requests: res(0.5, 512.0),
        };

        let aggregated = calculate_pipeline_resources(&[vec![heavy, light.clone()], vec![light]]);
        assert_eq!(aggregated.limits, res(2.5, 2560.0));
        assert_eq!(aggregated.requests, res(1.0, 1024.0));
    }
}
