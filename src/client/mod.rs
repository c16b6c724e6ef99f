// src/client/mod.rs

//! Pluggable cluster client abstraction.
//!
//! Steps talk to a `PodClient` instead of a concrete API client. Production
//! wiring hands in [`kube_api::KubePodClient`], an adapter over `kube::Api<Pod>`;
//! tests use [`fake::FakePodClient`], which keeps pods in memory and lets
//! the test play the part of the control plane through `update_status`.
//!
//! Every operation is namespaced. `watch` returns a [`PodWatch`]: an
//! ordered, explicitly stoppable stream of [`WatchEvent`]s.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::ClientResult;
use crate::pod::model::{Pod, PodExt};

pub mod fake;
pub mod kube_api;

pub use fake::FakePodClient;
pub use kube_api::KubePodClient;

/// Boxed future returned by client operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstracting the cluster's pod API.
pub trait PodClient: Send + Sync {
    /// Create `pod` in `namespace`; fails with `AlreadyExists` if a pod of
    /// that name is present.
    fn create<'a>(&'a self, namespace: &'a str, pod: Pod) -> BoxFuture<'a, ClientResult<Pod>>;

    /// Fetch the current pod, including its status; `NotFound` if absent.
    fn get<'a>(&'a self, namespace: &'a str, name: &'a str) -> BoxFuture<'a, ClientResult<Pod>>;

    /// Replace the status sub-object of an existing pod.
    ///
    /// Only a control plane (or a test simulating one) calls this.
    fn update_status<'a>(&'a self, namespace: &'a str, pod: Pod) -> BoxFuture<'a, ClientResult<Pod>>;

    /// Subscribe to changes of pods in `namespace` matching `options`.
    fn watch<'a>(
        &'a self,
        namespace: &'a str,
        options: ListOptions,
    ) -> BoxFuture<'a, ClientResult<PodWatch>>;

    /// Delete a pod; `NotFound` if absent.
    fn delete<'a>(&'a self, namespace: &'a str, name: &'a str) -> BoxFuture<'a, ClientResult<()>>;
}

/// Filter for `watch`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Only report the pod with exactly this name (`metadata.name` field
    /// selector). `None` reports every pod in the namespace.
    pub name: Option<String>,
}

impl ListOptions {
    pub fn for_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    pub fn matches(&self, pod: &Pod) -> bool {
        self.name.as_deref().is_none_or(|n| n == pod.name())
    }
}

/// One change delivered by a watch.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Added(Pod),
    Modified(Pod),
    Deleted(Pod),
    /// The server reported a problem with the watch itself.
    Error(String),
}

impl WatchEvent {
    pub fn pod(&self) -> Option<&Pod> {
        match self {
            WatchEvent::Added(p) | WatchEvent::Modified(p) | WatchEvent::Deleted(p) => Some(p),
            WatchEvent::Error(_) => None,
        }
    }
}

/// Live subscription to pod changes.
///
/// Events arrive in the order the control plane emitted them. The
/// subscription ends when the producer goes away or [`PodWatch::stop`] is
/// called; dropping the watch stops it as well.
#[derive(Debug)]
pub struct PodWatch {
    rx: mpsc::UnboundedReceiver<WatchEvent>,
    stopped: bool,
}

impl PodWatch {
    /// Wrap the receiving half of an event channel fed by a client backend.
    pub fn new(rx: mpsc::UnboundedReceiver<WatchEvent>) -> Self {
        Self { rx, stopped: false }
    }

    /// Next event, or `None` once the stream has ended or was stopped.
    pub async fn next(&mut self) -> Option<WatchEvent> {
        if self.stopped {
            return None;
        }
        self.rx.recv().await
    }

    /// Stop the subscription. Idempotent.
    pub fn stop(&mut self) {
        if !self.stopped {
            debug!("stopping pod watch");
            self.stopped = true;
            self.rx.close();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Drop for PodWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some(name.to_string());
        pod
    }

    #[test]
    fn list_options_filter_by_name() {
        assert!(ListOptions::default().matches(&named("a")));
        assert!(ListOptions::for_name("a").matches(&named("a")));
        assert!(!ListOptions::for_name("a").matches(&named("b")));
    }

    #[tokio::test]
    async fn stopped_watch_yields_nothing() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watch = PodWatch::new(rx);
        tx.send(WatchEvent::Error("boom".into())).unwrap();

        watch.stop();
        watch.stop();

        assert!(watch.is_stopped());
        assert_eq!(watch.next().await, None);
        assert!(tx.send(WatchEvent::Error("late".into())).is_err());
    }
}
