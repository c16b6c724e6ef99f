// src/types.rs

//! Small value types shared by the configuration, pod builder and steps.

use std::fmt;

use serde::Deserialize;

use crate::errors::Result;

/// Reference to a tag of an image stream (`<name>:<tag>`), optionally
/// qualified with the cluster and namespace it lives in.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(default)]
pub struct ImageStreamTagReference {
    pub cluster: String,
    pub namespace: String,
    pub name: String,
    pub tag: String,
    /// Alias under which the image is known inside the pipeline.
    #[serde(rename = "as")]
    pub as_name: String,
}

impl ImageStreamTagReference {
    /// Pull spec used for the container image: `<name>:<tag>`.
    pub fn image(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }

    /// True if this reference names an image at all.
    pub fn is_set(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Display for ImageStreamTagReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.namespace.is_empty() {
            write!(f, "{}/", self.namespace)?;
        }
        write!(f, "{}:{}", self.name, self.tag)
    }
}

/// Identity of the CI job a pipeline run belongs to.
///
/// Supplied once per run by the orchestrator and read-only for steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    pub job: String,
    pub build_id: String,
    pub prow_job_id: String,
    /// Namespace the pipeline's pods are created in.
    pub namespace: String,

    /// The serialized job context this identity was parsed from.
    ///
    /// Carried verbatim into the job-spec annotation on created pods.
    #[serde(skip)]
    pub raw_spec: String,
}

#[derive(Deserialize)]
struct SerializedJobSpec {
    #[serde(default)]
    job: String,
    #[serde(default, rename = "buildid")]
    build_id: String,
    #[serde(default)]
    prowjobid: String,
}

impl JobSpec {
    /// Parse a serialized job context (`{"job": .., "buildid": .., "prowjobid": ..}`)
    /// and remember the raw document for annotations.
    ///
    /// The namespace is not part of the serialized context; it is assigned
    /// by the orchestrator with [`JobSpec::in_namespace`].
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: SerializedJobSpec = serde_json::from_str(raw)?;
        Ok(Self {
            job: parsed.job,
            build_id: parsed.build_id,
            prow_job_id: parsed.prowjobid,
            namespace: String::new(),
            raw_spec: raw.to_string(),
        })
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// Treat `Some("")` the same as `None`.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_is_name_colon_tag() {
        let from = ImageStreamTagReference {
            cluster: "kluster".into(),
            name: "somename".into(),
            tag: "sometag".into(),
            as_name: "FromName".into(),
            ..Default::default()
        };
        assert_eq!(from.image(), "somename:sometag");
        assert_eq!(from.to_string(), "somename:sometag");
    }

    #[test]
    fn job_spec_from_json_keeps_raw_document() {
        let raw = r#"{"job":"very-cool-prow-job","buildid":"test-build-id","prowjobid":"prow-job-id"}"#;
        let spec = JobSpec::from_json(raw).unwrap().in_namespace("ns");

        assert_eq!(spec.job, "very-cool-prow-job");
        assert_eq!(spec.build_id, "test-build-id");
        assert_eq!(spec.prow_job_id, "prow-job-id");
        assert_eq!(spec.namespace, "ns");
        assert_eq!(spec.raw_spec, raw);
    }

    #[test]
    fn non_empty_filters_blank_strings() {
        assert_eq!(non_empty(&Some(String::new())), None);
        assert_eq!(non_empty(&None), None);
        assert_eq!(non_empty(&Some("x".into())), Some("x"));
    }
}
