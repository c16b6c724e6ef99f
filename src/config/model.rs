// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::pod::model::ResourceRequirements;
use crate::types::{ImageStreamTagReference, JobSpec, non_empty};

/// Pipeline configuration as read from a TOML document.
///
/// ```toml
/// [job]
/// job = "very-cool-prow-job"
/// build_id = "test-build-id"
/// prow_job_id = "prow-job-id"
/// namespace = "ci-op-1234"
///
/// [test.unit]
/// as = "unit"
/// commands = "make test"
/// secret_name = "test-credentials"
///
/// [test.unit.from]
/// name = "pipeline"
/// tag = "src"
/// ```
///
/// Keys of `[test.<name>]` are the *step names*; `as` is the name of the
/// pod the step creates.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineConfig {
    #[serde(default)]
    pub job: JobSpec,

    #[serde(default)]
    pub test: BTreeMap<String, PodStepConfiguration>,
}

/// Validated pipeline configuration.
///
/// Construct via `TryFrom<RawPipelineConfig>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub job: JobSpec,
    pub test: BTreeMap<String, PodStepConfiguration>,
}

impl PipelineConfig {
    pub(crate) fn new_unchecked(job: JobSpec, test: BTreeMap<String, PodStepConfiguration>) -> Self {
        Self { job, test }
    }
}

/// Declarative configuration of a single pod step.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PodStepConfiguration {
    /// Name of the pod the step creates.
    #[serde(rename = "as")]
    pub as_name: String,

    /// Image the single container runs.
    #[serde(default)]
    pub from: ImageStreamTagReference,

    /// Shell script executed inside the container.
    pub commands: String,

    /// Directory inside the container where the script should leave
    /// artifacts; exported as `ARTIFACT_DIR`.
    #[serde(default)]
    pub artifact_dir: Option<String>,

    #[serde(default)]
    pub service_account_name: Option<String>,

    /// Secret mounted read-only into the container.
    #[serde(default)]
    pub secret_name: Option<String>,

    /// Where the secret is mounted; defaults to
    /// [`DEFAULT_SECRET_MOUNT_PATH`](crate::pod::spec::DEFAULT_SECRET_MOUNT_PATH).
    #[serde(default)]
    pub secret_mount_path: Option<String>,

    /// Container requests and limits, in the cluster API's shape
    /// (`[test.<name>.resources.requests]` with `cpu = "100m"`, ...).
    #[serde(default)]
    pub resources: ResourceRequirements,
}

impl PodStepConfiguration {
    pub fn secret_name(&self) -> Option<&str> {
        non_empty(&self.secret_name)
    }

    pub fn secret_mount_path(&self) -> Option<&str> {
        non_empty(&self.secret_mount_path)
    }

    pub fn artifact_dir(&self) -> Option<&str> {
        non_empty(&self.artifact_dir)
    }

    pub fn service_account_name(&self) -> Option<&str> {
        non_empty(&self.service_account_name)
    }
}
