// src/config/validate.rs

use std::collections::HashMap;
use std::path::Path;

use crate::config::model::{PipelineConfig, PodStepConfiguration, RawPipelineConfig};
use crate::errors::{Result, StepError};

impl TryFrom<RawPipelineConfig> for PipelineConfig {
    type Error = StepError;

    fn try_from(raw: RawPipelineConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(PipelineConfig::new_unchecked(raw.job, raw.test))
    }
}

fn validate_raw_config(cfg: &RawPipelineConfig) -> Result<()> {
    ensure_has_steps(cfg)?;
    validate_job(cfg)?;
    for (name, step) in cfg.test.iter() {
        validate_step(name, step)?;
    }
    validate_unique_pod_names(cfg)?;
    Ok(())
}

fn ensure_has_steps(cfg: &RawPipelineConfig) -> Result<()> {
    if cfg.test.is_empty() {
        return Err(StepError::ConfigError(
            "config must contain at least one [test.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_job(cfg: &RawPipelineConfig) -> Result<()> {
    if cfg.job.namespace.trim().is_empty() {
        return Err(StepError::ConfigError(
            "[job].namespace must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Structural checks for a single step; shared with the pod builder.
pub fn validate_step(name: &str, step: &PodStepConfiguration) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StepError::ConfigError("step name must not be empty".to_string()));
    }
    if step.as_name.trim().is_empty() {
        return Err(StepError::ConfigError(format!(
            "step '{}' must set a non-empty `as`",
            name
        )));
    }
    if step.commands.trim().is_empty() {
        return Err(StepError::ConfigError(format!(
            "step '{}' must set non-empty `commands`",
            name
        )));
    }
    validate_image_reference(name, step)?;
    if let Some(path) = step.secret_mount_path() {
        if !Path::new(path).is_absolute() {
            return Err(StepError::ConfigError(format!(
                "step '{}' has relative secret_mount_path '{}'",
                name, path
            )));
        }
        if path.split('/').any(|seg| seg == "." || seg == "..") {
            return Err(StepError::ConfigError(format!(
                "step '{}' has secret_mount_path '{}' with a '.' or '..' segment",
                name, path
            )));
        }
    }
    Ok(())
}

/// The image a step runs must name both an image stream and a tag.
pub fn validate_image_reference(name: &str, step: &PodStepConfiguration) -> Result<()> {
    if step.from.name.trim().is_empty() || step.from.tag.trim().is_empty() {
        return Err(StepError::ConfigError(format!(
            "step '{}' has an incomplete image reference '{}:{}'",
            name, step.from.name, step.from.tag
        )));
    }
    Ok(())
}

fn validate_unique_pod_names(cfg: &RawPipelineConfig) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for (name, step) in cfg.test.iter() {
        if let Some(other) = seen.insert(step.as_name.as_str(), name.as_str()) {
            return Err(StepError::ConfigError(format!(
                "steps '{}' and '{}' both create pod '{}'",
                other, name, step.as_name
            )));
        }
    }
    Ok(())
}
