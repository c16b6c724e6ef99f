// src/steps/pod_step.rs

//! A step that runs its commands in a single pod.
//!
//! One [`RunGuard`] spans the whole run: a cancel or an expired deadline
//! stops the watch, lookup and create calls as well as the wait.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::link::StepLink;
use crate::api::step::{ExecutionResult, InputDefinition, Parameters, RunContext, Step};
use crate::client::{BoxFuture, ListOptions, PodClient};
use crate::config::model::PodStepConfiguration;
use crate::config::validate::validate_image_reference;
use crate::errors::{ClientError, Result, StepError, StepPhase};
use crate::pod::fingerprint::same_spec;
use crate::pod::model::{Pod, PodExt};
use crate::pod::spec::build_pod;
use crate::steps::completion::{CompletionWatcher, classify_pod, wait_for_completion};
use crate::steps::guard::RunGuard;
use crate::types::JobSpec;

/// Runs `config.commands` in a pod named `config.as_name` and reports the
/// pod's terminal phase.
///
/// The step owns the pod it creates: it writes the spec, the cluster writes
/// the status. Runs never delete the pod; see [`PodStep::cleanup`].
pub struct PodStep {
    name: String,
    config: PodStepConfiguration,
    client: Arc<dyn PodClient>,
    job_spec: Arc<JobSpec>,
}

impl fmt::Debug for PodStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodStep")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("job_spec", &self.job_spec)
            .finish_non_exhaustive()
    }
}

impl PodStep {
    pub fn new(
        name: impl Into<String>,
        config: PodStepConfiguration,
        client: Arc<dyn PodClient>,
        job_spec: Arc<JobSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            client,
            job_spec,
        }
    }

    /// Logical step name; used for the container and the sub-test annotation.
    pub fn step_name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PodStepConfiguration {
        &self.config
    }

    pub fn job_spec(&self) -> &JobSpec {
        &self.job_spec
    }

    fn namespace(&self) -> &str {
        &self.job_spec.namespace
    }

    fn pod_name(&self) -> &str {
        &self.config.as_name
    }

    /// The pod this step runs as. Pure; no cluster access.
    pub fn pod_object(&self) -> Result<Pod> {
        build_pod(&self.name, &self.config, &self.job_spec)
    }

    /// Best-effort removal of the step's pod. A pod that is already gone is
    /// not an error.
    pub async fn cleanup(&self) -> Result<()> {
        match self.client.delete(self.namespace(), self.pod_name()).await {
            Ok(()) => {
                info!(step = %self.name, pod = %self.pod_name(), "deleted pod");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(StepError::client(&self.name, StepPhase::Delete, e)),
        }
    }

    async fn execute(&self, ctx: RunContext) -> Result<ExecutionResult> {
        let pod = self.pod_object()?;
        let namespace = self.namespace();
        let pod_name = self.pod_name();
        let mut guard = RunGuard::new(&self.name, ctx);

        info!(step = %self.name, pod = %pod_name, namespace, "running pod step");

        // Subscribe before anything else so the pod's only transition to a
        // terminal phase cannot slip between create and watch.
        let mut watch = guard
            .guard(self.client.watch(namespace, ListOptions::for_name(pod_name)))
            .await?
            .map_err(|e| StepError::client(&self.name, StepPhase::Watch, e))?;

        let mut watcher = CompletionWatcher::new(pod_name);

        match guard.guard(self.client.get(namespace, pod_name)).await? {
            Ok(existing) => {
                self.resume(&pod, &existing, &mut watcher);
            }
            Err(e) if e.is_not_found() => {
                self.create(pod, &mut watcher, &mut guard).await?;
            }
            Err(e) => return Err(StepError::client(&self.name, StepPhase::Lookup, e)),
        }

        if let Some(result) = watcher.result() {
            watch.stop();
            return Ok(result.clone());
        }

        let result = wait_for_completion(&mut watcher, &mut watch, &mut guard).await?;
        info!(step = %self.name, pod = %pod_name, %result, "pod step finished");
        Ok(result)
    }

    /// Adopt a pod left behind by an earlier run.
    fn resume(&self, desired: &Pod, existing: &Pod, watcher: &mut CompletionWatcher) {
        info!(
            step = %self.name,
            pod = %existing.name(),
            phase = %existing.phase(),
            "pod already exists; resuming"
        );
        match same_spec(desired, existing) {
            Ok(true) => {}
            Ok(false) => warn!(
                step = %self.name,
                pod = %existing.name(),
                "existing pod was built from a different configuration"
            ),
            Err(e) => debug!(step = %self.name, error = %e, "could not fingerprint pod"),
        }
        watcher.observe_pod(existing);
    }

    async fn create(
        &self,
        pod: Pod,
        watcher: &mut CompletionWatcher,
        guard: &mut RunGuard,
    ) -> Result<()> {
        let namespace = self.namespace();
        match guard.guard(self.client.create(namespace, pod.clone())).await? {
            Ok(created) => {
                debug!(step = %self.name, pod = %created.name(), "pod created");
                watcher.mark_created();
                Ok(())
            }
            Err(ClientError::AlreadyExists { .. }) => {
                // Someone created it between our lookup and create.
                let existing = guard
                    .guard(self.client.get(namespace, self.pod_name()))
                    .await?
                    .map_err(|e| StepError::client(&self.name, StepPhase::Lookup, e))?;
                self.resume(&pod, &existing, watcher);
                Ok(())
            }
            Err(e) => Err(StepError::client(&self.name, StepPhase::Create, e)),
        }
    }
}

impl Step for PodStep {
    fn name(&self) -> &str {
        &self.config.as_name
    }

    fn requires(&self) -> Vec<StepLink> {
        if self.config.from.is_set() {
            vec![StepLink::images_ready()]
        } else {
            Vec::new()
        }
    }

    fn creates(&self) -> Vec<StepLink> {
        Vec::new()
    }

    fn provides(&self) -> (Parameters, Option<StepLink>) {
        (Parameters::new(), None)
    }

    fn inputs(&self) -> Result<InputDefinition> {
        validate_image_reference(&self.name, &self.config)?;
        Ok(InputDefinition::new())
    }

    fn run(&self, ctx: RunContext) -> BoxFuture<'_, Result<ExecutionResult>> {
        Box::pin(self.execute(ctx))
    }

    fn done(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            match self.client.get(self.namespace(), self.pod_name()).await {
                Ok(pod) => Ok(classify_pod(&pod).is_some()),
                Err(e) if e.is_not_found() => Ok(false),
                Err(e) => Err(StepError::client(&self.name, StepPhase::Lookup, e)),
            }
        })
    }
}
