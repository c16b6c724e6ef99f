// src/steps/mod.rs

//! Concrete steps.
//!
//! - [`pod_step`] runs a script in a single pod and reports its outcome.
//! - [`completion`] holds the state machine that decides when that pod has
//!   finished, plus the async loop that feeds it watch events.
//! - [`guard`] bounds every await of a run by its cancel signal and deadline.

pub mod completion;
pub mod guard;
pub mod pod_step;

use std::sync::Arc;

pub use completion::{CompletionState, CompletionWatcher, classify_pod, wait_for_completion};
pub use guard::RunGuard;
pub use pod_step::PodStep;

use crate::api::step::Step;
use crate::client::PodClient;
use crate::config::model::PipelineConfig;

/// Build one [`PodStep`] per `[test.<name>]` entry, all sharing `client`
/// and the job identity.
pub fn pod_steps_from_config(cfg: &PipelineConfig, client: Arc<dyn PodClient>) -> Vec<Arc<dyn Step>> {
    let job_spec = Arc::new(cfg.job.clone());
    cfg.test
        .iter()
        .map(|(name, step)| {
            Arc::new(PodStep::new(
                name.clone(),
                step.clone(),
                Arc::clone(&client),
                Arc::clone(&job_spec),
            )) as Arc<dyn Step>
        })
        .collect()
}
