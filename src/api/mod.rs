// src/api/mod.rs

//! Types shared between steps and the scheduler that runs them.
//!
//! - [`link`] defines the graph edges steps require and create.
//! - [`step`] defines the `Step` trait and the values passed through it.

pub mod link;
pub mod step;

pub use link::StepLink;
pub use step::{ExecutionResult, InputDefinition, Parameters, RunContext, Step};
