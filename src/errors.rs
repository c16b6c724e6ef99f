// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`PodClient`](crate::client::PodClient).
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("pod {namespace}/{name} already exists")]
    AlreadyExists { namespace: String, name: String },

    #[error("pod {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClientError::AlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

/// Which part of the run protocol a client call belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Lookup,
    Create,
    Watch,
    Delete,
}

impl fmt::Display for StepPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepPhase::Lookup => "lookup",
            StepPhase::Create => "create",
            StepPhase::Watch => "watch",
            StepPhase::Delete => "delete",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum StepError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("step '{step}' failed during {phase}: {source}")]
    Client {
        step: String,
        phase: StepPhase,
        #[source]
        source: ClientError,
    },

    #[error("step '{step}' failed: {message}")]
    WorkloadFailed { step: String, message: String },

    #[error("step '{step}' was cancelled while waiting for its pod")]
    Cancelled { step: String },

    #[error("step '{step}' timed out after {after:?} waiting for its pod")]
    Timeout { step: String, after: Duration },

    #[error("Cycle detected in step graph: {0}")]
    DagCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StepError {
    pub(crate) fn client(step: &str, phase: StepPhase, source: ClientError) -> Self {
        StepError::Client {
            step: step.to_string(),
            phase,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StepError>;
pub type ClientResult<T> = std::result::Result<T, ClientError>;
