// src/pod/mod.rs

//! The pod a step runs as.
//!
//! - [`model`] re-exports the cluster's pod types and adds typed reads.
//! - [`spec`] turns a step configuration into a pod (pure, deterministic).
//! - [`fingerprint`] hashes the step-owned part of a pod for drift checks.

pub mod fingerprint;
pub mod model;
pub mod spec;

pub use model::{Pod, PodExt, PodPhase, PodStatus, status_with_phase};
pub use spec::{DEFAULT_SECRET_MOUNT_PATH, build_pod};
