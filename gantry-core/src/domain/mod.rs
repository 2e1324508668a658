//! Core domain types
//!
//! The pipeline/stage/task/cron records the engine operates on. Persistence
//! lives outside this workspace; these structures mirror what the storage
//! collaborator hands in and what executors need to drive remote workloads.

pub mod cron;
pub mod pipeline;
pub mod stage;
pub mod task;
