//! Data Transfer Objects for the scheduler control-plane API
//!
//! Wire representations exchanged with the job scheduler over HTTP. These
//! mirror the scheduler's JSON contract exactly; domain types are converted
//! at this boundary and nowhere else.

pub mod job;
