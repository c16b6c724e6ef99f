// src/lib.rs

//! Pipeline steps that run their work as a single pod in a cluster.
//!
//! A [`PodStep`] turns its configuration into a pod spec, creates the pod,
//! watches it until it reaches a terminal phase, and reports the outcome
//! as an [`ExecutionResult`]. Steps expose the [`Step`] contract so that an
//! external scheduler can order them by the [`StepLink`]s they require and
//! create.

pub mod api;
pub mod client;
pub mod config;
pub mod dag;
pub mod errors;
pub mod logging;
pub mod pod;
pub mod steps;
pub mod types;

pub use api::{ExecutionResult, RunContext, Step, StepLink};
pub use client::{FakePodClient, KubePodClient, PodClient};
pub use config::{PipelineConfig, PodStepConfiguration};
pub use dag::StepGraph;
pub use errors::{ClientError, Result, StepError};
pub use steps::{PodStep, pod_steps_from_config};
pub use types::{ImageStreamTagReference, JobSpec};
