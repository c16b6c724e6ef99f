// src/steps/guard.rs

//! Cancellation and deadline for one run of a step.
//!
//! The deadline starts when the guard is built, at the top of a run, and
//! every await of the run goes through [`RunGuard::guard`]. Cluster calls
//! made before the watch loop are bounded the same way as the wait for
//! events.

use std::future::{Future, pending};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until};
use tracing::info;

use crate::api::step::RunContext;
use crate::errors::{Result, StepError};

enum Interrupt<T> {
    Done(T),
    Cancelled,
    CancelSenderDropped,
    TimedOut,
}

#[derive(Debug)]
pub struct RunGuard {
    step: String,
    cancel: Option<oneshot::Receiver<()>>,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl RunGuard {
    pub fn new(step: impl Into<String>, ctx: RunContext) -> Self {
        let RunContext { cancel, timeout } = ctx;
        Self {
            step: step.into(),
            cancel,
            timeout,
            deadline: timeout.map(|after| Instant::now() + after),
        }
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    /// Await `fut` unless the run is cancelled or out of time first.
    ///
    /// A cancellation that already happened wins before `fut` is polled,
    /// so no side effect of `fut` starts. Dropping the cancel sender
    /// without sending does not cancel.
    pub async fn guard<F: Future>(&mut self, fut: F) -> Result<F::Output> {
        tokio::pin!(fut);

        loop {
            let cancel = &mut self.cancel;
            let deadline = self.deadline;

            let outcome = tokio::select! {
                biased;

                res = async {
                    match cancel.as_mut() {
                        Some(rx) => rx.await,
                        None => pending().await,
                    }
                } => match res {
                    Ok(()) => Interrupt::Cancelled,
                    Err(_) => Interrupt::CancelSenderDropped,
                },

                _ = async {
                    match deadline {
                        Some(at) => sleep_until(at).await,
                        None => pending::<()>().await,
                    }
                } => Interrupt::TimedOut,

                out = &mut fut => Interrupt::Done(out),
            };

            match outcome {
                Interrupt::Done(out) => return Ok(out),
                Interrupt::CancelSenderDropped => {
                    self.cancel = None;
                }
                Interrupt::Cancelled => {
                    info!(step = %self.step, "run cancelled; leaving pod in place");
                    return Err(StepError::Cancelled {
                        step: self.step.clone(),
                    });
                }
                Interrupt::TimedOut => {
                    let after = self.timeout.unwrap_or_default();
                    info!(step = %self.step, ?after, "run timed out; leaving pod in place");
                    return Err(StepError::Timeout {
                        step: self.step.clone(),
                        after,
                    });
                }
            }
        }
    }
}
