//! Error types for executor operations

use thiserror::Error;

/// Result type alias for executor operations
pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;

/// Errors that can occur while driving a task through its backend
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Task record has no namespace
    #[error("task missing namespace")]
    MissingNamespace,

    /// Task record has no UUID
    #[error("task missing UUID")]
    MissingUuid,

    /// Task payload cannot be turned into a backend request
    #[error("invalid task spec: {0}")]
    InvalidSpec(String),

    /// Operation is not part of this backend's lifecycle
    #[error("{kind} executor does not support {op}")]
    Unsupported { kind: String, op: &'static str },

    /// Scheduler answered without a status; `last_message` explains why
    /// (a "not found" message here means the job was never created)
    #[error("got empty status from scheduler, last message: {last_message}")]
    EmptyStatus { last_message: String },

    /// Scheduler accepted the request but reported a failure in its
    /// reply envelope
    #[error("scheduler replied with error: {0}")]
    Reply(String),

    /// Backend reported a state that cannot be classified
    #[error("unexpected status: {0}")]
    UnexpectedStatus(String),

    /// Namespace cleanup requested while workloads are still in it
    #[error("namespace {namespace} still has {remaining} workload(s), skip cleanup")]
    NamespaceBusy { namespace: String, remaining: usize },

    /// Transport-level failure talking to the scheduler
    #[error(transparent)]
    Client(#[from] gantry_client::ClientError),

    /// Kubernetes API failure
    #[error(transparent)]
    Kube(#[from] kube::Error),

    /// Payload (de)serialization failure
    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExecutorError {
    /// Whether this error means "the backend has no such record"
    ///
    /// Existence probes and cleanup treat these as information rather
    /// than failures.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::EmptyStatus { last_message } => last_message.contains("not found"),
            Self::Client(e) => e.is_not_found(),
            Self::Kube(kube::Error::Api(resp)) => resp.code == 404,
            _ => false,
        }
    }
}
