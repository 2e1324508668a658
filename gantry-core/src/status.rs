//! Pipeline status model
//!
//! The canonical status vocabulary shared by pipelines and tasks, plus the
//! classification predicates the rest of the engine is built on. Executors
//! translate their backend's native states into this enum; the reconciler,
//! calculators and capability machine only ever see these values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a pipeline or task
///
/// Serialized as the exact PascalCase name (e.g. `"StopByUser"`), matching
/// what the scheduler backend and persisted records carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStatus {
    /// Precheck passed, waiting for a manual or cron trigger
    #[default]
    Analyzed,
    /// Accepted by the reconciler, not yet scheduled
    Born,
    /// Suspended by the user before execution
    Paused,
    /// Reconciler-internal marker while tasks are being prepared
    Mark,
    /// Remote unit created in the control plane, workload not started
    Created,
    /// Waiting for cluster resources
    Queue,
    Running,
    Success,
    Failed,
    Timeout,
    /// Cancelled by an explicit user stop
    StopByUser,
    /// Skipped by the system (e.g. disabled branch)
    NoNeedBySystem,
    CreateError,
    /// Creation succeeded but the workload never started
    StartError,
    Error,
    #[serde(rename = "DBError")]
    DbError,
    Unknown,
    LostConn,
    CancelByRemote,
    /// Pseudo status for disabled tasks; never reached at runtime
    Disabled,
    /// The backend has no record of the workload. Boundary information for
    /// existence probes, never persisted as a terminal state.
    NotFoundInCluster,
}

impl PipelineStatus {
    /// The exact serialized name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Analyzed => "Analyzed",
            Self::Born => "Born",
            Self::Paused => "Paused",
            Self::Mark => "Mark",
            Self::Created => "Created",
            Self::Queue => "Queue",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Timeout => "Timeout",
            Self::StopByUser => "StopByUser",
            Self::NoNeedBySystem => "NoNeedBySystem",
            Self::CreateError => "CreateError",
            Self::StartError => "StartError",
            Self::Error => "Error",
            Self::DbError => "DBError",
            Self::Unknown => "Unknown",
            Self::LostConn => "LostConn",
            Self::CancelByRemote => "CancelByRemote",
            Self::Disabled => "Disabled",
            Self::NotFoundInCluster => "NotFoundInCluster",
        }
    }

    pub fn is_success_status(self) -> bool {
        self == Self::Success
    }

    /// Terminal failure of any flavor, user- or system-initiated
    pub fn is_failed_status(self) -> bool {
        matches!(
            self,
            Self::Failed
                | Self::Timeout
                | Self::StopByUser
                | Self::NoNeedBySystem
                | Self::CreateError
                | Self::StartError
                | Self::Error
                | Self::DbError
                | Self::Unknown
                | Self::LostConn
                | Self::CancelByRemote
        )
    }

    /// Terminal either way: nothing will change this status anymore
    pub fn is_end_status(self) -> bool {
        self.is_success_status() || self.is_failed_status()
    }

    /// Statuses the reconciler is still actively driving
    pub fn is_reconciler_running_status(self) -> bool {
        matches!(
            self,
            Self::Born | Self::Paused | Self::Mark | Self::Created | Self::Queue | Self::Running
        )
    }

    pub fn can_unpause(self) -> bool {
        self == Self::Paused
    }

    /// Deletion is only sensible before execution or after it finished
    pub fn can_delete(self) -> bool {
        self == Self::Analyzed || self.is_end_status()
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status with a human-readable description
///
/// What `status()` on an executor returns: the translated status plus the
/// backend's last message for display and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatusDesc {
    pub status: PipelineStatus,
    pub desc: String,
}

impl PipelineStatusDesc {
    pub fn new(status: PipelineStatus, desc: impl Into<String>) -> Self {
        Self {
            status,
            desc: desc.into(),
        }
    }
}

impl fmt::Display for PipelineStatusDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.desc.is_empty() {
            write!(f, "{}", self.status)
        } else {
            write!(f, "{} ({})", self.status, self.desc)
        }
    }
}
