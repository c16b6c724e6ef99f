// src/pod/fingerprint.rs

//! Content fingerprint of the step-owned part of a pod.
//!
//! Used when a run resumes against a pod that already exists, to notice
//! that the pod was created from a different configuration than the one
//! the step would build now.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::Result;
use crate::pod::model::{Pod, PodSpec};

/// Only fields the step writes. Server-populated metadata (uid,
/// resourceVersion, timestamps) and the status never take part.
#[derive(Serialize)]
struct Owned<'a> {
    name: Option<&'a str>,
    namespace: Option<&'a str>,
    labels: Option<&'a BTreeMap<String, String>>,
    annotations: Option<&'a BTreeMap<String, String>>,
    spec: Option<&'a PodSpec>,
}

/// Hex-encoded blake3 hash of the pod's identity, labels, annotations and
/// spec.
pub fn spec_fingerprint(pod: &Pod) -> Result<String> {
    let owned = Owned {
        name: pod.metadata.name.as_deref(),
        namespace: pod.metadata.namespace.as_deref(),
        labels: pod.metadata.labels.as_ref(),
        annotations: pod.metadata.annotations.as_ref(),
        spec: pod.spec.as_ref(),
    };
    let bytes = serde_json::to_vec(&owned)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// True if both pods were built from the same step configuration.
pub fn same_spec(a: &Pod, b: &Pod) -> Result<bool> {
    Ok(spec_fingerprint(a)? == spec_fingerprint(b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pod::model::{ObjectMeta, PodPhase, status_with_phase};

    fn pod(name: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("ns".to_string()),
                labels: Some(BTreeMap::from([("build-id".to_string(), "1".to_string())])),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn status_does_not_affect_fingerprint() {
        let a = pod("p");
        let mut b = pod("p");
        b.status = Some(status_with_phase(PodPhase::Failed));

        assert!(same_spec(&a, &b).unwrap());
    }

    #[test]
    fn server_populated_metadata_is_ignored() {
        let a = pod("p");
        let mut b = pod("p");
        b.metadata.uid = Some("0b7f6a52".to_string());
        b.metadata.resource_version = Some("4711".to_string());

        assert!(same_spec(&a, &b).unwrap());
    }

    #[test]
    fn metadata_changes_fingerprint() {
        let a = pod("p");
        let mut b = pod("p");
        b.metadata
            .labels
            .get_or_insert_default()
            .insert("build-id".to_string(), "2".to_string());

        assert!(!same_spec(&a, &b).unwrap());
        assert_eq!(spec_fingerprint(&a).unwrap().len(), 64);
    }
}
