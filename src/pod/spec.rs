// src/pod/spec.rs

//! Pure translation of a step configuration into the pod it runs as.
//!
//! [`build_pod`] has no side effects: the same inputs always produce the
//! same [`Pod`], which lets a scheduler re-diff or retry a step safely.

use std::collections::BTreeMap;

use crate::config::model::PodStepConfiguration;
use crate::config::validate::validate_image_reference;
use crate::errors::{Result, StepError};
use crate::pod::model::{
    Container, EnvVar, ObjectMeta, Pod, PodSpec, RESTART_POLICY_NEVER, SecretVolumeSource,
    TERMINATION_MESSAGE_FALLBACK_TO_LOGS, Volume, VolumeMount,
};
use crate::types::JobSpec;

/// Mount path used when a secret is configured without an explicit path.
pub const DEFAULT_SECRET_MOUNT_PATH: &str = "/usr/test-secrets";

pub const BUILD_ID_LABEL: &str = "build-id";
pub const JOB_LABEL: &str = "job";
pub const CREATED_BY_CI_LABEL: &str = "created-by-ci";
pub const PERSISTS_LABEL: &str = "persists-between-builds";
pub const PROW_JOB_ID_LABEL: &str = "prow.k8s.io/id";

pub const JOB_SPEC_ANNOTATION: &str = "ci.openshift.io/job-spec";
pub const CONTAINER_SUB_TESTS_ANNOTATION: &str = "ci-operator.openshift.io/container-sub-tests";

pub const ARTIFACT_DIR_ENV: &str = "ARTIFACT_DIR";

/// Build the pod for the step called `step_name`.
///
/// Fails only when the configuration is structurally unusable.
pub fn build_pod(step_name: &str, config: &PodStepConfiguration, job: &JobSpec) -> Result<Pod> {
    if step_name.trim().is_empty() {
        return Err(StepError::ConfigError("step name must not be empty".to_string()));
    }
    if config.as_name.trim().is_empty() {
        return Err(StepError::ConfigError(format!(
            "step '{}' must set a non-empty `as`",
            step_name
        )));
    }
    validate_image_reference(step_name, config)?;

    let (volumes, volume_mounts) = secret_volumes(config);

    let container = Container {
        name: step_name.to_string(),
        image: Some(config.from.image()),
        command: Some(shell_command(&config.commands)),
        env: container_env(config),
        resources: Some(config.resources.clone()),
        volume_mounts: Some(volume_mounts),
        termination_message_policy: Some(TERMINATION_MESSAGE_FALLBACK_TO_LOGS.to_string()),
        ..Default::default()
    };

    Ok(Pod {
        metadata: ObjectMeta {
            name: Some(config.as_name.clone()),
            namespace: Some(job.namespace.clone()),
            labels: Some(pod_labels(job)),
            annotations: Some(pod_annotations(step_name, job)),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container],
            volumes: Some(volumes),
            restart_policy: Some(RESTART_POLICY_NEVER.to_string()),
            service_account_name: config.service_account_name().map(str::to_string),
            ..Default::default()
        }),
        status: None,
    })
}

/// Wrap a script so it stops at the first failing command.
pub fn shell_command(commands: &str) -> Vec<String> {
    vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        format!("#!/bin/sh\nset -eu\n{}", commands),
    ]
}

fn pod_labels(job: &JobSpec) -> BTreeMap<String, String> {
    BTreeMap::from([
        (BUILD_ID_LABEL.to_string(), job.build_id.clone()),
        (CREATED_BY_CI_LABEL.to_string(), "true".to_string()),
        (JOB_LABEL.to_string(), job.job.clone()),
        (PERSISTS_LABEL.to_string(), "false".to_string()),
        (PROW_JOB_ID_LABEL.to_string(), job.prow_job_id.clone()),
    ])
}

fn pod_annotations(step_name: &str, job: &JobSpec) -> BTreeMap<String, String> {
    BTreeMap::from([
        (JOB_SPEC_ANNOTATION.to_string(), job.raw_spec.clone()),
        (CONTAINER_SUB_TESTS_ANNOTATION.to_string(), step_name.to_string()),
    ])
}

fn container_env(config: &PodStepConfiguration) -> Option<Vec<EnvVar>> {
    config.artifact_dir().map(|dir| {
        vec![EnvVar {
            name: ARTIFACT_DIR_ENV.to_string(),
            value: Some(dir.to_string()),
            ..Default::default()
        }]
    })
}

/// Volumes and mounts for the configured secret.
///
/// Both vectors are empty (never absent) when no secret is configured,
/// whatever the mount path says.
fn secret_volumes(config: &PodStepConfiguration) -> (Vec<Volume>, Vec<VolumeMount>) {
    let Some(secret) = config.secret_name() else {
        return (Vec::new(), Vec::new());
    };

    let mount_path = config
        .secret_mount_path()
        .unwrap_or(DEFAULT_SECRET_MOUNT_PATH);

    let volume = Volume {
        name: secret.to_string(),
        secret: Some(SecretVolumeSource {
            secret_name: Some(secret.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mount = VolumeMount {
        name: secret.to_string(),
        mount_path: mount_path.to_string(),
        sub_path: Some(last_path_segment(mount_path)),
        read_only: Some(true),
        ..Default::default()
    };

    (vec![volume], vec![mount])
}

/// Final element of a slash-separated path, ignoring trailing slashes.
/// `"/usr/.."` yields `".."`; the root yields `"/"`.
fn last_path_segment(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { ".".to_string() } else { "/".to_string() };
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}
