// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{PipelineConfig, RawPipelineConfig};
use crate::errors::Result;

/// Parse a TOML document into a `RawPipelineConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`parse_and_validate`] for that.
pub fn parse_str(contents: &str) -> Result<RawPipelineConfig> {
    let config: RawPipelineConfig = toml::from_str(contents)?;
    Ok(config)
}

/// Parse and validate a TOML document.
pub fn parse_and_validate(contents: &str) -> Result<PipelineConfig> {
    PipelineConfig::try_from(parse_str(contents)?)
}

/// Load a configuration file from a given path without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineConfig> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Load a configuration file from path and validate it.
///
/// This is the recommended entry point for whoever assembles a pipeline:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks step names, image references, mount paths and pod name
///   uniqueness.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineConfig> {
    let raw_config = load_from_path(&path)?;
    let config = PipelineConfig::try_from(raw_config)?;
    Ok(config)
}
