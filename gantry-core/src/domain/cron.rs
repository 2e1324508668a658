//! Cron trigger domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recurring trigger definition attached to a pipeline source
///
/// `enable` is tri-state: `None` means the record has never been toggled
/// and neither start nor stop applies to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineCron {
    pub id: u64,
    pub cron_expr: String,
    pub enable: Option<bool>,
    pub time_created: Option<DateTime<Utc>>,
    pub time_updated: Option<DateTime<Utc>>,
    /// Last point up to which missed triggers were compensated
    pub last_compensate_at: Option<DateTime<Utc>>,
}

impl PipelineCron {
    pub fn is_enabled(&self) -> bool {
        self.enable == Some(true)
    }
}
