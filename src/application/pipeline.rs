use crate::application::publisher::{self, PublishError};
use crate::application::stage_runner::{self, StageError};
use crate::config::PipelineConfig;
use crate::domain::plan::plan_stages;
use crate::domain::template::TemplateError;
use crate::ports::job_client::JobClientPort;
use crate::ports::storage::RemoteStorePort;
use std::fmt;

#[derive(Debug)]
pub enum PipelineError {
    Plan(TemplateError),
    Publish(PublishError),
    Stage(StageError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Plan(e) => write!(f, "{}", e),
            PipelineError::Publish(e) => write!(f, "{}", e),
            PipelineError::Stage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Plan(e) => Some(e),
            PipelineError::Publish(e) => Some(e),
            PipelineError::Stage(e) => Some(e),
        }
    }
}

impl From<PublishError> for PipelineError {
    fn from(err: PublishError) -> Self {
        PipelineError::Publish(err)
    }
}

impl From<StageError> for PipelineError {
    fn from(err: StageError) -> Self {
        PipelineError::Stage(err)
    }
}

/// The pipeline orchestrator: resolves the configuration into the ordered
/// stage plan and runs the enabled stages strictly sequentially, one
/// stage's completion gating the next submission. The first failure aborts
/// the run; completed stages keep their outputs and a re-run overwrites
/// them in place.
pub struct PipelineService<J, S> {
    client: J,
    store: S,
    config: PipelineConfig,
}

impl<J, S> PipelineService<J, S>
where
    J: JobClientPort,
    S: RemoteStorePort,
{
    pub fn new(client: J, store: S, config: PipelineConfig) -> Self {
        Self {
            client,
            store,
            config,
        }
    }

    pub async fn run(&self) -> Result<(), PipelineError> {
        let stages = plan_stages(&self.config).map_err(PipelineError::Plan)?;

        if self.config.dry_run {
            for plan in stages.iter().filter(|p| p.enabled) {
                let spec = plan.to_spec();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&spec).expect("job spec serializes")
                );
            }
            return Ok(());
        }

        if self.config.upload_assets {
            println!(
                "publishing assets from {} to {}",
                self.config.local_asset_dir.display(),
                self.config.asset_bundle
            );
            publisher::publish(
                &self.store,
                &self.config.local_asset_dir,
                &self.config.asset_bundle,
            )
            .await?;
        }

        for plan in stages.iter().filter(|p| p.enabled) {
            stage_runner::run_stage(&self.client, plan).await?;
        }

        Ok(())
    }
}
