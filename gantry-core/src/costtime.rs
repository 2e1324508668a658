//! Elapsed and queued duration calculators
//!
//! All calculators share the same shape: a cached non-negative value wins,
//! a missing begin timestamp yields the `-1` sentinel, and inconsistent
//! records (terminal status without an end timestamp) fall back to the
//! last-updated time so display never shows a duration that keeps growing
//! after the entity finished.

use chrono::{DateTime, Utc};

use crate::domain::pipeline::Pipeline;
use crate::domain::task::PipelineTask;

/// Seconds a pipeline has been (or was) running, `-1` if it never began
pub fn calculate_pipeline_cost_time_sec(pipeline: &Pipeline) -> i64 {
    elapsed_sec(
        pipeline.cost_time_sec,
        pipeline.status.is_end_status(),
        pipeline.time_begin,
        pipeline.time_end,
        pipeline.time_updated,
    )
}

/// Seconds a task has been (or was) running, `-1` if it never began
pub fn calculate_task_cost_time_sec(task: &PipelineTask) -> i64 {
    elapsed_sec(
        task.cost_time_sec,
        task.status.is_end_status(),
        task.time_begin,
        task.time_end,
        task.time_updated,
    )
}

/// Seconds a task spent queued before execution
///
/// Finished tasks never report a negative queue time: clock skew between
/// the queue timestamps is clamped to `0` once the task is terminal.
pub fn calculate_task_queue_time_sec(task: &PipelineTask) -> i64 {
    let cost = elapsed_sec(
        task.queue_time_sec,
        task.status.is_end_status(),
        task.extra.time_begin_queue,
        task.extra.time_end_queue,
        task.time_updated,
    );
    if task.status.is_end_status() && cost < 0 {
        return 0;
    }
    cost
}

fn elapsed_sec(
    cached: i64,
    is_end: bool,
    begin: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    updated: Option<DateTime<Utc>>,
) -> i64 {
    if cached >= 0 {
        return cached;
    }
    let Some(begin) = begin else {
        return -1;
    };
    if end.is_none() && !is_end {
        return (Utc::now() - begin).num_seconds();
    }
    // terminal but the end timestamp was never written; the last update is
    // the closest record of when it actually finished
    match end.or(updated) {
        Some(end) => (end - begin).num_seconds(),
        None => (Utc::now() - begin).num_seconds(),
    }
}
