// src/api/step.rs

//! The contract every pipeline step exposes to the scheduler.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::api::link::StepLink;
use crate::client::BoxFuture;
use crate::errors::{Result, StepError};

/// Parameters a step publishes for downstream steps, by name.
pub type Parameters = BTreeMap<String, String>;

/// Resolved input values a step depends on, by name.
pub type InputDefinition = BTreeMap<String, String>;

/// Outcome of one run of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Succeeded,
    /// The work ran and failed; carries a human-readable reason.
    Failed(String),
}

impl ExecutionResult {
    /// Turn a `Failed` result into [`StepError::WorkloadFailed`], for
    /// callers that treat a failed step as an error.
    pub fn into_result(self, step: &str) -> Result<()> {
        match self {
            ExecutionResult::Succeeded => Ok(()),
            ExecutionResult::Failed(message) => Err(StepError::WorkloadFailed {
                step: step.to_string(),
                message,
            }),
        }
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionResult::Succeeded => f.write_str("succeeded"),
            ExecutionResult::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Per-run controls handed to [`Step::run`].
///
/// - `cancel`: firing the sender stops the run; dropping it without sending
///   does not.
/// - `timeout`: upper bound on the whole run, counted from when it starts.
#[derive(Debug, Default)]
pub struct RunContext {
    pub cancel: Option<oneshot::Receiver<()>>,
    pub timeout: Option<Duration>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation signal; returns the sender that triggers it.
    pub fn cancellable() -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                cancel: Some(rx),
                timeout: None,
            },
            tx,
        )
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A unit of pipeline work.
///
/// The scheduler only ever holds `dyn Step` values: it orders steps by
/// their links and calls `run` once their requirements are met.
pub trait Step: Send + Sync {
    /// Stable name of the step within the pipeline.
    fn name(&self) -> &str;

    /// Links that must exist before this step may run.
    fn requires(&self) -> Vec<StepLink>;

    /// Links that exist once this step has succeeded.
    fn creates(&self) -> Vec<StepLink>;

    /// Parameters published for other steps, and the link that makes them
    /// available.
    fn provides(&self) -> (Parameters, Option<StepLink>) {
        (Parameters::new(), None)
    }

    /// Validate and resolve the step's inputs without touching the cluster.
    fn inputs(&self) -> Result<InputDefinition>;

    /// Execute the step.
    fn run(&self, ctx: RunContext) -> BoxFuture<'_, Result<ExecutionResult>>;

    /// Whether the step's work has already completed.
    fn done(&self) -> BoxFuture<'_, Result<bool>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_converts_to_workload_failed() {
        let err = ExecutionResult::Failed("exit 1".into())
            .into_result("unit")
            .unwrap_err();
        match err {
            StepError::WorkloadFailed { step, message } => {
                assert_eq!(step, "unit");
                assert_eq!(message, "exit 1");
            }
            other => panic!("expected WorkloadFailed, got {other:?}"),
        }
        assert!(ExecutionResult::Succeeded.into_result("unit").is_ok());
    }

    #[test]
    fn cancellable_context_carries_receiver() {
        let (ctx, _tx) = RunContext::cancellable();
        let ctx = ctx.with_timeout(Duration::from_secs(1));
        assert!(ctx.cancel.is_some());
        assert_eq!(ctx.timeout, Some(Duration::from_secs(1)));
    }
}
