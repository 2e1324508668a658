//! Gantry Action Executors
//!
//! The executor framework drives one pipeline task through its remote
//! lifecycle: create, start, poll status, cancel, remove. Every backend
//! implements the same [`ActionExecutor`] contract and translates its
//! native status vocabulary into the shared `PipelineStatus` model, so
//! the reconciler never sees backend-specific states.
//!
//! Backends:
//! - `scheduler`: HTTP proxy to the job scheduler control plane
//! - `k8sflink` / `k8sspark`: Kubernetes custom resources driven by the
//!   respective operators
//! - `wait`: in-process timer
//! - `apitest` / `mysqlconfigsheet`: synchronous steps polled through the
//!   persisted task record
//! - `memory` / `demo`: test stubs
//!
//! Executors are constructed through an explicit [`Registry`]: one
//! registered constructor per `Kind`, one live instance per
//! `(Kind, Name)` pair.

pub mod error;
pub mod plugins;
pub mod registry;
pub mod transfer;
pub mod types;

pub use error::{ExecutorError, ExecutorResult};
pub use registry::{AnyExecutor, Constructor, Registry, RegistryError};
pub use types::{ActionExecutor, Existence, TaskFuture, TaskPromise, task_promise};
