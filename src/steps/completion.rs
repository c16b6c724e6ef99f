// src/steps/completion.rs

//! Waiting for a pod to reach a terminal phase.
//!
//! [`CompletionWatcher`] is a pure, synchronous state machine:
//!
//! ```text
//! NotStarted -> Created -> Watching -> Terminal(Succeeded | Failed)
//! ```
//!
//! It consumes watch events one at a time and never leaves `Terminal`, so
//! stale events that arrive late cannot change a reported result.
//! [`wait_for_completion`] is the async shell around it: it reads events
//! from a [`PodWatch`] through the run's [`RunGuard`], so cancellation and
//! the deadline interrupt the wait.

use tracing::{debug, info, warn};

use crate::api::step::ExecutionResult;
use crate::client::{PodWatch, WatchEvent};
use crate::errors::Result;
use crate::pod::model::{Pod, PodExt, PodPhase};
use crate::steps::guard::RunGuard;

pub const WATCH_CLOSED_REASON: &str = "watch closed unexpectedly";
pub const DELETED_REASON: &str = "pod deleted before completion";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionState {
    NotStarted,
    Created,
    Watching,
    Terminal(ExecutionResult),
}

/// Decide whether `pod` has finished, and how.
///
/// A pod counts as failed if its phase is `Failed` **or** any container
/// terminated with a non-zero exit code, even when the phase also says
/// `Succeeded`.
pub fn classify_pod(pod: &Pod) -> Option<ExecutionResult> {
    let failed_containers: Vec<String> = pod
        .terminated_containers()
        .into_iter()
        .filter(|(_, t)| t.exit_code != 0)
        .map(|(name, t)| format!("container {} exited with code {}", name, t.exit_code))
        .collect();

    let phase = pod.phase();
    if phase == PodPhase::Failed || !failed_containers.is_empty() {
        let reason = pod
            .status_message()
            .or_else(|| pod.status_reason())
            .map(str::to_string)
            .or_else(|| (!failed_containers.is_empty()).then(|| failed_containers.join("; ")))
            .unwrap_or_else(|| format!("pod {} failed", pod.name()));
        return Some(ExecutionResult::Failed(reason));
    }

    match phase {
        PodPhase::Succeeded => Some(ExecutionResult::Succeeded),
        _ => None,
    }
}

/// State machine tracking one pod until it finishes.
#[derive(Debug, Clone)]
pub struct CompletionWatcher {
    pod_name: String,
    state: CompletionState,
}

impl CompletionWatcher {
    pub fn new(pod_name: impl Into<String>) -> Self {
        Self {
            pod_name: pod_name.into(),
            state: CompletionState::NotStarted,
        }
    }

    pub fn pod_name(&self) -> &str {
        &self.pod_name
    }

    pub fn state(&self) -> &CompletionState {
        &self.state
    }

    pub fn result(&self) -> Option<&ExecutionResult> {
        match &self.state {
            CompletionState::Terminal(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.result().is_some()
    }

    /// The pod was created by this run.
    pub fn mark_created(&mut self) {
        if self.state == CompletionState::NotStarted {
            self.state = CompletionState::Created;
        }
    }

    /// Start consuming events. Allowed straight from `NotStarted` when
    /// resuming against a pod that already exists.
    pub fn start_watching(&mut self) {
        if matches!(self.state, CompletionState::NotStarted | CompletionState::Created) {
            self.state = CompletionState::Watching;
        }
    }

    /// Inspect a pod snapshot obtained outside the watch (e.g. via `get`).
    pub fn observe_pod(&mut self, pod: &Pod) -> Option<&ExecutionResult> {
        if !self.is_terminal() && pod.name() == self.pod_name {
            if let Some(result) = classify_pod(pod) {
                self.finish(result);
            }
        }
        self.result()
    }

    /// Feed one watch event; returns the result once terminal.
    pub fn observe(&mut self, event: &WatchEvent) -> Option<&ExecutionResult> {
        if let Some(result) = self.result() {
            debug!(pod = %self.pod_name, ?result, "ignoring event after terminal state");
            return self.result();
        }

        match event {
            WatchEvent::Error(message) => {
                warn!(pod = %self.pod_name, error = %message, "transient watch error; continuing");
            }
            WatchEvent::Added(pod) | WatchEvent::Modified(pod) => {
                if pod.name() != self.pod_name {
                    debug!(pod = %pod.name(), watched = %self.pod_name, "ignoring event for unrelated pod");
                } else {
                    debug!(pod = %self.pod_name, phase = %pod.phase(), "pod event");
                    if let Some(result) = classify_pod(pod) {
                        self.finish(result);
                    }
                }
            }
            WatchEvent::Deleted(pod) => {
                if pod.name() == self.pod_name {
                    let result = classify_pod(pod)
                        .unwrap_or_else(|| ExecutionResult::Failed(DELETED_REASON.to_string()));
                    self.finish(result);
                }
            }
        }

        self.result()
    }

    /// The event stream ended. Without a terminal phase this is a failure.
    pub fn stream_closed(&mut self) -> ExecutionResult {
        if let Some(result) = self.result() {
            return result.clone();
        }
        warn!(pod = %self.pod_name, "watch closed before the pod finished");
        let result = ExecutionResult::Failed(WATCH_CLOSED_REASON.to_string());
        self.finish(result.clone());
        result
    }

    fn finish(&mut self, result: ExecutionResult) {
        info!(pod = %self.pod_name, %result, "pod reached a terminal phase");
        self.state = CompletionState::Terminal(result);
    }
}

/// Drive `watcher` from `watch` until the pod finishes, the run is
/// cancelled, or the run's deadline passes.
///
/// The watch is stopped on every return path; the pod itself is left in
/// place.
pub async fn wait_for_completion(
    watcher: &mut CompletionWatcher,
    watch: &mut PodWatch,
    guard: &mut RunGuard,
) -> Result<ExecutionResult> {
    watcher.start_watching();

    let outcome = loop {
        if let Some(result) = watcher.result() {
            break Ok(result.clone());
        }

        match guard.guard(watch.next()).await {
            Ok(Some(event)) => {
                watcher.observe(&event);
            }
            Ok(None) => break Ok(watcher.stream_closed()),
            Err(e) => {
                debug!(step = %guard.step(), pod = %watcher.pod_name(), "stopped waiting for pod");
                break Err(e);
            }
        }
    };

    watch.stop();
    outcome
}
