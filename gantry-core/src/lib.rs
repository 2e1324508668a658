//! Gantry Core
//!
//! Core types and pure logic for the Gantry pipeline engine.
//!
//! This crate contains:
//! - Domain types: Pipeline, PipelineStage, PipelineTask, PipelineCron
//! - Status model: the canonical `PipelineStatus` enum and its predicates
//! - Executor identity: validated `Kind`/`Name` newtypes
//! - Calculators: cost/queue time, applied-resource aggregation
//! - Capability state machine: which user operations are currently legal
//! - DTOs: wire types for the scheduler control-plane API
//!
//! Note: Persistence and the reconciler loop live outside this workspace;
//! everything here is computable from the records they hand in.

pub mod capability;
pub mod costtime;
pub mod domain;
pub mod dto;
pub mod identity;
pub mod resource;
pub mod status;

pub use identity::{IdentityError, Kind, Name};
pub use status::{PipelineStatus, PipelineStatusDesc};
