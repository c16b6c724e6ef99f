// src/api/link.rs

//! Dependency-graph edges between steps.

use std::fmt;

use crate::types::ImageStreamTagReference;

/// An edge in the step graph: something one step makes available and
/// another step waits for.
///
/// Links are plain values; two links are the same edge iff they compare
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepLink {
    /// Every image the pipeline needs has been built or imported.
    ImagesReady,
    /// A tag of the pipeline's own image stream is available.
    InternalImage(String),
    /// An image outside the pipeline's namespace is available.
    ExternalImage(ImageStreamTagReference),
}

impl StepLink {
    pub fn images_ready() -> Self {
        StepLink::ImagesReady
    }

    pub fn internal_image(tag: impl Into<String>) -> Self {
        StepLink::InternalImage(tag.into())
    }

    pub fn external_image(reference: ImageStreamTagReference) -> Self {
        StepLink::ExternalImage(reference)
    }
}

impl fmt::Display for StepLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepLink::ImagesReady => f.write_str("images ready"),
            StepLink::InternalImage(tag) => write!(f, "internal image {tag}"),
            StepLink::ExternalImage(r) => write!(f, "external image {r}"),
        }
    }
}
