// src/config/mod.rs

//! Configuration model, loading and validation for pod steps.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a pipeline fragment from a string or disk (`loader.rs`).
//! - Validate structural invariants before any cluster call (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_and_validate, parse_str};
pub use model::{PipelineConfig, PodStepConfiguration, RawPipelineConfig};
pub use validate::{validate_image_reference, validate_step};
