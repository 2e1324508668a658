//! Backend executor implementations
//!
//! One module per executor kind. Every backend translates its own status
//! vocabulary into `PipelineStatus` inside `status()` and honors the
//! idempotent `create`/`start` contract.

pub mod apitest;
pub mod demo;
pub mod k8s;
pub mod memory;
pub mod mysql_config_sheet;
pub mod scheduler;
pub mod wait;
