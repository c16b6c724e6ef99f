// src/client/kube_api.rs

//! `PodClient` over a real API server, through `kube::Api<Pod>`.

use futures::StreamExt;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams, WatchParams};
use kube::core::WatchEvent as ApiWatchEvent;
use kube::Client;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{BoxFuture, ListOptions, PodClient, PodWatch, WatchEvent};
use crate::errors::{ClientError, ClientResult};
use crate::pod::model::Pod;

/// Resource version `0` asks the server for the current state first, so a
/// watch opened on an existing pod starts with an `Added` for it.
const WATCH_FROM_CURRENT: &str = "0";

#[derive(Clone)]
pub struct KubePodClient {
    client: Client,
}

impl std::fmt::Debug for KubePodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePodClient").finish_non_exhaustive()
    }
}

impl KubePodClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient kubeconfig or in-cluster service account.
    pub async fn try_default() -> anyhow::Result<Self> {
        Ok(Self::new(Client::try_default().await?))
    }

    fn api(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Map API status codes onto the errors the step protocol branches on.
fn client_error(err: kube::Error, namespace: &str, name: &str) -> ClientError {
    match err {
        kube::Error::Api(resp) if resp.code == 409 => ClientError::AlreadyExists {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        kube::Error::Api(resp) if resp.code == 404 => ClientError::NotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        other => ClientError::Other(other.into()),
    }
}

fn watch_params(options: &ListOptions) -> WatchParams {
    match &options.name {
        Some(name) => WatchParams::default().fields(&format!("metadata.name={name}")),
        None => WatchParams::default(),
    }
}

fn translate(event: ApiWatchEvent<Pod>) -> Option<WatchEvent> {
    match event {
        ApiWatchEvent::Added(pod) => Some(WatchEvent::Added(pod)),
        ApiWatchEvent::Modified(pod) => Some(WatchEvent::Modified(pod)),
        ApiWatchEvent::Deleted(pod) => Some(WatchEvent::Deleted(pod)),
        ApiWatchEvent::Bookmark(_) => None,
        ApiWatchEvent::Error(resp) => Some(WatchEvent::Error(resp.to_string())),
    }
}

/// Open the server-side watch, report whether that worked through `ready`,
/// then forward events until the server ends the stream or the consumer
/// stops its `PodWatch`.
async fn forward_events(
    api: Api<Pod>,
    params: WatchParams,
    namespace: String,
    ready: oneshot::Sender<ClientResult<()>>,
    tx: mpsc::UnboundedSender<WatchEvent>,
) {
    let stream = match api.watch(&params, WATCH_FROM_CURRENT).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready.send(Err(client_error(e, &namespace, "")));
            return;
        }
    };
    if ready.send(Ok(())).is_err() {
        return;
    }
    tokio::pin!(stream);

    loop {
        tokio::select! {
            _ = tx.closed() => {
                debug!(namespace = %namespace, "pod watch stopped by consumer");
                break;
            }
            item = stream.next() => {
                let event = match item {
                    Some(Ok(event)) => translate(event),
                    Some(Err(e)) => {
                        warn!(namespace = %namespace, error = %e, "pod watch stream error");
                        Some(WatchEvent::Error(e.to_string()))
                    }
                    None => {
                        debug!(namespace = %namespace, "pod watch ended by server");
                        break;
                    }
                };
                if let Some(event) = event {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

impl PodClient for KubePodClient {
    fn create<'a>(&'a self, namespace: &'a str, pod: Pod) -> BoxFuture<'a, ClientResult<Pod>> {
        Box::pin(async move {
            let name = pod.metadata.name.clone().unwrap_or_default();
            self.api(namespace)
                .create(&PostParams::default(), &pod)
                .await
                .map_err(|e| client_error(e, namespace, &name))
        })
    }

    fn get<'a>(&'a self, namespace: &'a str, name: &'a str) -> BoxFuture<'a, ClientResult<Pod>> {
        Box::pin(async move {
            self.api(namespace)
                .get(name)
                .await
                .map_err(|e| client_error(e, namespace, name))
        })
    }

    fn update_status<'a>(&'a self, namespace: &'a str, pod: Pod) -> BoxFuture<'a, ClientResult<Pod>> {
        Box::pin(async move {
            let name = pod.metadata.name.clone().unwrap_or_default();
            let patch = serde_json::json!({ "status": pod.status });
            self.api(namespace)
                .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
                .await
                .map_err(|e| client_error(e, namespace, &name))
        })
    }

    fn watch<'a>(
        &'a self,
        namespace: &'a str,
        options: ListOptions,
    ) -> BoxFuture<'a, ClientResult<PodWatch>> {
        Box::pin(async move {
            let (ready_tx, ready_rx) = oneshot::channel();
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(forward_events(
                self.api(namespace),
                watch_params(&options),
                namespace.to_string(),
                ready_tx,
                tx,
            ));

            ready_rx.await.map_err(|_| {
                ClientError::Other(anyhow::anyhow!("pod watch task exited before subscribing"))
            })??;
            Ok(PodWatch::new(rx))
        })
    }

    fn delete<'a>(&'a self, namespace: &'a str, name: &'a str) -> BoxFuture<'a, ClientResult<()>> {
        Box::pin(async move {
            self.api(namespace)
                .delete(name, &DeleteParams::default())
                .await
                .map(|_| ())
                .map_err(|e| client_error(e, namespace, name))
        })
    }
}
