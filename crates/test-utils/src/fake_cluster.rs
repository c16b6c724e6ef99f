use podstep::client::{FakePodClient, ListOptions, PodClient, WatchEvent};
use podstep::pod::model::{PodExt, PodPhase, PodStatus, status_with_phase};
use tokio::task::JoinHandle;
use tracing::info;

/// Play the control plane for a single pod.
///
/// Opens a watch on `namespace` immediately (so it cannot miss the
/// creation), then waits for the first event about a pod and moves that
/// pod's status to `status`. The returned handle resolves to the name of
/// the pod that was updated, or `None` if the watch ended first.
pub async fn spawn_cluster_behaviour(
    client: FakePodClient,
    namespace: &str,
    status: PodStatus,
) -> anyhow::Result<JoinHandle<Option<String>>> {
    let namespace = namespace.to_string();
    let mut watch = client.watch(&namespace, ListOptions::default()).await?;

    Ok(tokio::spawn(async move {
        while let Some(event) = watch.next().await {
            let Some(pod) = event.pod() else {
                info!(?event, "fake cluster: received non-pod event");
                continue;
            };
            if matches!(event, WatchEvent::Deleted(_)) {
                continue;
            }

            info!(pod = %pod.name(), phase = ?status.phase, "fake cluster: updating pod status");
            let mut updated = pod.clone();
            updated.status = Some(status.clone());
            if let Err(e) = client.update_status(&namespace, updated).await {
                info!(error = %e, "fake cluster: update_status failed");
                return None;
            }
            return Some(pod.name().to_string());
        }
        info!("fake cluster: watch closed, exiting");
        None
    }))
}

/// Convenience for [`spawn_cluster_behaviour`] with a bare phase.
pub async fn spawn_phase_behaviour(
    client: FakePodClient,
    namespace: &str,
    phase: PodPhase,
) -> anyhow::Result<JoinHandle<Option<String>>> {
    spawn_cluster_behaviour(client, namespace, status_with_phase(phase)).await
}
