#![allow(dead_code)]

use podstep::config::PodStepConfiguration;
use podstep::types::{ImageStreamTagReference, JobSpec};

/// Builder for `PodStepConfiguration`, pre-filled with a runnable step.
pub struct PodStepConfigurationBuilder {
    config: PodStepConfiguration,
}

impl PodStepConfigurationBuilder {
    pub fn new(as_name: &str, commands: &str) -> Self {
        Self {
            config: PodStepConfiguration {
                as_name: as_name.to_string(),
                from: ImageStreamTagReference {
                    name: "pipeline".to_string(),
                    tag: "src".to_string(),
                    ..Default::default()
                },
                commands: commands.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn from(mut self, cluster: &str, name: &str, tag: &str, as_name: &str) -> Self {
        self.config.from = ImageStreamTagReference {
            cluster: cluster.to_string(),
            namespace: String::new(),
            name: name.to_string(),
            tag: tag.to_string(),
            as_name: as_name.to_string(),
        };
        self
    }

    pub fn secret(mut self, name: &str) -> Self {
        self.config.secret_name = Some(name.to_string());
        self
    }

    pub fn secret_mount_path(mut self, path: &str) -> Self {
        self.config.secret_mount_path = Some(path.to_string());
        self
    }

    pub fn service_account(mut self, name: &str) -> Self {
        self.config.service_account_name = Some(name.to_string());
        self
    }

    pub fn artifact_dir(mut self, dir: &str) -> Self {
        self.config.artifact_dir = Some(dir.to_string());
        self
    }

    pub fn build(self) -> PodStepConfiguration {
        self.config
    }
}

/// Builder for `JobSpec`.
pub struct JobSpecBuilder {
    spec: JobSpec,
}

impl JobSpecBuilder {
    pub fn new(namespace: &str) -> Self {
        Self {
            spec: JobSpec {
                namespace: namespace.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn job(mut self, job: &str) -> Self {
        self.spec.job = job.to_string();
        self
    }

    pub fn build_id(mut self, build_id: &str) -> Self {
        self.spec.build_id = build_id.to_string();
        self
    }

    pub fn prow_job_id(mut self, id: &str) -> Self {
        self.spec.prow_job_id = id.to_string();
        self
    }

    pub fn build(self) -> JobSpec {
        self.spec
    }
}
