// src/client/fake.rs

//! In-memory `PodClient` used by tests and local dry runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

use super::{BoxFuture, ListOptions, PodClient, PodWatch, WatchEvent};
use crate::errors::{ClientError, ClientResult};
use crate::pod::model::{Pod, PodExt};

/// A call made against the fake, recorded for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create { namespace: String, name: String },
    Get { namespace: String, name: String },
    UpdateStatus { namespace: String, name: String },
    Watch { namespace: String, options: ListOptions },
    Delete { namespace: String, name: String },
}

#[derive(Debug)]
struct Subscriber {
    namespace: String,
    options: ListOptions,
    tx: mpsc::UnboundedSender<WatchEvent>,
}

#[derive(Debug, Default)]
struct FakeState {
    /// Pods keyed by (namespace, name).
    pods: BTreeMap<(String, String), Pod>,
    subscribers: Vec<Subscriber>,
    actions: Vec<Action>,
}

impl FakeState {
    /// Deliver `event` to every live subscriber it matches, dropping
    /// subscribers whose watch was stopped.
    fn broadcast(&mut self, namespace: &str, event: WatchEvent) {
        self.subscribers.retain(|sub| {
            if sub.tx.is_closed() {
                return false;
            }
            let wanted = sub.namespace == namespace
                && event.pod().is_none_or(|pod| sub.options.matches(pod));
            !wanted || sub.tx.send(event.clone()).is_ok()
        });
    }
}

/// Cheaply cloneable in-memory pod store with watch support.
///
/// Clones share state, so a test can hand one clone to the step and keep
/// another to act as the cluster.
#[derive(Debug, Clone, Default)]
pub struct FakePodClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakePodClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a pod directly, as if it had been created earlier.
    pub fn insert(&self, pod: Pod) {
        let key = (pod.namespace().to_string(), pod.name().to_string());
        self.state().pods.insert(key, pod);
    }

    /// Every call made so far, in order.
    pub fn actions(&self) -> Vec<Action> {
        self.state().actions.clone()
    }

    /// Number of `create` calls made so far.
    pub fn create_count(&self) -> usize {
        self.state()
            .actions
            .iter()
            .filter(|a| matches!(a, Action::Create { .. }))
            .count()
    }

    /// Number of watches that are still open.
    pub fn open_watches(&self) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|s| !s.tx.is_closed());
        state.subscribers.len()
    }

    /// Deliver an arbitrary event to matching watchers of `namespace`.
    pub fn inject(&self, namespace: &str, event: WatchEvent) {
        self.state().broadcast(namespace, event);
    }

    /// End every open watch, as a server-side timeout would.
    pub fn close_watches(&self) {
        self.state().subscribers.clear();
    }

    fn record(&self, action: Action) -> MutexGuard<'_, FakeState> {
        let mut state = self.state();
        state.actions.push(action);
        state
    }
}

fn not_found(namespace: &str, name: &str) -> ClientError {
    ClientError::NotFound {
        namespace: namespace.to_string(),
        name: name.to_string(),
    }
}

impl PodClient for FakePodClient {
    fn create<'a>(&'a self, namespace: &'a str, mut pod: Pod) -> BoxFuture<'a, ClientResult<Pod>> {
        Box::pin(async move {
            let name = pod.name().to_string();
            let mut state = self.record(Action::Create {
                namespace: namespace.to_string(),
                name: name.clone(),
            });

            let key = (namespace.to_string(), name.clone());
            if state.pods.contains_key(&key) {
                return Err(ClientError::AlreadyExists {
                    namespace: namespace.to_string(),
                    name,
                });
            }

            pod.metadata.namespace = Some(namespace.to_string());
            state.pods.insert(key, pod.clone());
            debug!(pod = %name, namespace, "fake cluster: pod created");
            state.broadcast(namespace, WatchEvent::Added(pod.clone()));
            Ok(pod)
        })
    }

    fn get<'a>(&'a self, namespace: &'a str, name: &'a str) -> BoxFuture<'a, ClientResult<Pod>> {
        Box::pin(async move {
            let state = self.record(Action::Get {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
            state
                .pods
                .get(&(namespace.to_string(), name.to_string()))
                .cloned()
                .ok_or_else(|| not_found(namespace, name))
        })
    }

    fn update_status<'a>(&'a self, namespace: &'a str, pod: Pod) -> BoxFuture<'a, ClientResult<Pod>> {
        Box::pin(async move {
            let name = pod.name().to_string();
            let mut state = self.record(Action::UpdateStatus {
                namespace: namespace.to_string(),
                name: name.clone(),
            });

            let stored = state
                .pods
                .get_mut(&(namespace.to_string(), name.clone()))
                .ok_or_else(|| not_found(namespace, &name))?;
            stored.status = pod.status;
            let updated = stored.clone();

            debug!(pod = %name, namespace, phase = %updated.phase(), "fake cluster: status updated");
            state.broadcast(namespace, WatchEvent::Modified(updated.clone()));
            Ok(updated)
        })
    }

    fn watch<'a>(
        &'a self,
        namespace: &'a str,
        options: ListOptions,
    ) -> BoxFuture<'a, ClientResult<PodWatch>> {
        Box::pin(async move {
            let mut state = self.record(Action::Watch {
                namespace: namespace.to_string(),
                options: options.clone(),
            });
            let (tx, rx) = mpsc::unbounded_channel();
            state.subscribers.push(Subscriber {
                namespace: namespace.to_string(),
                options,
                tx,
            });
            Ok(PodWatch::new(rx))
        })
    }

    fn delete<'a>(&'a self, namespace: &'a str, name: &'a str) -> BoxFuture<'a, ClientResult<()>> {
        Box::pin(async move {
            let mut state = self.record(Action::Delete {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
            let pod = state
                .pods
                .remove(&(namespace.to_string(), name.to_string()))
                .ok_or_else(|| not_found(namespace, name))?;
            state.broadcast(namespace, WatchEvent::Deleted(pod));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pod::model::{PodPhase, status_with_phase};

    fn pod(name: &str) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some(name.to_string());
        pod
    }

    #[tokio::test]
    async fn create_twice_reports_already_exists() {
        let client = FakePodClient::new();
        client.create("ns", pod("a")).await.unwrap();

        let err = client.create("ns", pod("a")).await.unwrap_err();
        assert!(err.is_already_exists());

        // Same name in another namespace is fine.
        client.create("other", pod("a")).await.unwrap();
        assert_eq!(client.create_count(), 3);
    }

    #[tokio::test]
    async fn get_missing_reports_not_found() {
        let client = FakePodClient::new();
        let err = client.get("ns", "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_status_only_touches_status_and_notifies() {
        let client = FakePodClient::new();
        let mut watch = client.watch("ns", ListOptions::for_name("a")).await.unwrap();
        client.create("ns", pod("a")).await.unwrap();

        let mut changed = pod("a");
        changed
            .metadata
            .labels
            .get_or_insert_default()
            .insert("sneaky".into(), "label".into());
        changed.status = Some(status_with_phase(PodPhase::Succeeded));
        client.update_status("ns", changed).await.unwrap();

        let stored = client.get("ns", "a").await.unwrap();
        assert_eq!(stored.phase(), PodPhase::Succeeded);
        assert!(stored.metadata.labels.is_none());

        assert!(matches!(watch.next().await, Some(WatchEvent::Added(_))));
        match watch.next().await {
            Some(WatchEvent::Modified(p)) => assert_eq!(p.phase(), PodPhase::Succeeded),
            other => panic!("expected Modified, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn watch_filters_by_namespace_and_name() {
        let client = FakePodClient::new();
        let mut watch = client.watch("ns", ListOptions::for_name("a")).await.unwrap();

        client.create("other", pod("a")).await.unwrap();
        client.create("ns", pod("b")).await.unwrap();
        client.create("ns", pod("a")).await.unwrap();

        match watch.next().await {
            Some(WatchEvent::Added(p)) => {
                assert_eq!(p.name(), "a");
                assert_eq!(p.namespace(), "ns");
            }
            other => panic!("expected Added for ns/a, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stopped_watches_are_pruned() {
        let client = FakePodClient::new();
        let mut watch = client.watch("ns", ListOptions::default()).await.unwrap();
        assert_eq!(client.open_watches(), 1);

        watch.stop();
        assert_eq!(client.open_watches(), 0);

        drop(watch);
        client.create("ns", pod("a")).await.unwrap();
    }

    #[tokio::test]
    async fn close_watches_ends_streams() {
        let client = FakePodClient::new();
        let mut watch = client.watch("ns", ListOptions::default()).await.unwrap();

        client.close_watches();
        assert_eq!(watch.next().await, None);
    }

    #[tokio::test]
    async fn delete_notifies_watchers() {
        let client = FakePodClient::new();
        client.create("ns", pod("a")).await.unwrap();
        let mut watch = client.watch("ns", ListOptions::default()).await.unwrap();

        client.delete("ns", "a").await.unwrap();

        assert!(matches!(watch.next().await, Some(WatchEvent::Deleted(_))));
        assert!(client.delete("ns", "a").await.unwrap_err().is_not_found());
    }
}
