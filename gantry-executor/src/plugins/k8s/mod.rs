//! Kubernetes CRD-backed executors
//!
//! Flink and Spark workloads run as operator-managed custom resources.
//! Both executors share the same preparation steps: ensure the task
//! namespace, propagate the image-pull secret into it, then create the
//! CRD owned by that namespace so deleting the namespace cascades.

pub mod common;
pub mod flink;
pub mod spark;
