// src/pod/model.rs

//! Pod objects as the cluster API defines them.
//!
//! The types are `k8s_openapi`'s. Nearly every field there is optional, so
//! [`PodExt`] gives the handful of reads this crate makes a plain shape,
//! and [`PodPhase`] is a typed view of the phase string.

use std::fmt;

pub use k8s_openapi::api::core::v1::{
    Container, ContainerState, ContainerStateTerminated, ContainerStatus, EnvVar, Pod, PodSpec,
    PodStatus, ResourceRequirements, SecretVolumeSource, Volume, VolumeMount,
};
pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

pub const RESTART_POLICY_NEVER: &str = "Never";
pub const TERMINATION_MESSAGE_FALLBACK_TO_LOGS: &str = "FallbackToLogsOnError";

/// Lifecycle phase reported by the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PodPhase {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        }
    }

    /// Unrecognised phase strings read as `Unknown`.
    pub fn parse(phase: &str) -> Self {
        match phase {
            "Pending" => PodPhase::Pending,
            "Running" => PodPhase::Running,
            "Succeeded" => PodPhase::Succeeded,
            "Failed" => PodPhase::Failed,
            _ => PodPhase::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status carrying only `phase`, as a control plane would first report it.
pub fn status_with_phase(phase: PodPhase) -> PodStatus {
    PodStatus {
        phase: Some(phase.as_str().to_string()),
        ..Default::default()
    }
}

/// Non-optional reads of the pod fields the step cares about.
pub trait PodExt {
    /// `metadata.name`, or `""` when unset.
    fn name(&self) -> &str;

    /// `metadata.namespace`, or `""` when unset.
    fn namespace(&self) -> &str;

    /// Phase from the status sub-object; `Pending` when nothing is reported.
    fn phase(&self) -> PodPhase;

    fn status_message(&self) -> Option<&str>;

    fn status_reason(&self) -> Option<&str>;

    /// Containers that have terminated, with their final state.
    fn terminated_containers(&self) -> Vec<(&str, &ContainerStateTerminated)>;
}

impl PodExt for Pod {
    fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or_default()
    }

    fn phase(&self) -> PodPhase {
        self.status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .map(PodPhase::parse)
            .unwrap_or_default()
    }

    fn status_message(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.message.as_deref())
            .filter(|m| !m.is_empty())
    }

    fn status_reason(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|s| s.reason.as_deref())
            .filter(|r| !r.is_empty())
    }

    fn terminated_containers(&self) -> Vec<(&str, &ContainerStateTerminated)> {
        self.status
            .iter()
            .flat_map(|s| s.container_statuses.iter().flatten())
            .filter_map(|cs| {
                cs.state
                    .as_ref()
                    .and_then(|st| st.terminated.as_ref())
                    .map(|t| (cs.name.as_str(), t))
            })
            .collect()
    }
}
