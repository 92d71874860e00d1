use crate::domain::jobs::InputMode;
use crate::domain::plan::StagePlan;
use crate::ports::job_client::{JobClientError, JobClientPort};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    Submit,
    AddInputs,
    Wait,
    JobFailed,
}

/// A stage failure. Fatal to the pipeline: there is no retry, the operator
/// re-runs the whole pipeline and stage outputs are overwritten idempotently.
#[derive(Debug)]
pub struct StageError {
    pub stage: &'static str,
    pub kind: StageErrorKind,
    pub source: JobClientError,
}

impl StageError {
    fn new(stage: &'static str, kind: StageErrorKind, source: JobClientError) -> Self {
        Self {
            stage,
            kind,
            source,
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            StageErrorKind::Submit => "submission rejected",
            StageErrorKind::AddInputs => "adding inputs rejected",
            StageErrorKind::Wait => "wait failed",
            StageErrorKind::JobFailed => "job failed",
        };
        write!(f, "stage {}: {}: {}", self.stage, what, self.source)
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Run one stage to completion: build its job spec, submit it in the mode
/// the plan calls for, inject explicit inputs in operator order, and block
/// until the remote service reports a terminal state.
pub async fn run_stage<J: JobClientPort>(client: &J, plan: &StagePlan) -> Result<(), StageError> {
    let spec = plan.to_spec();
    let mode = match plan.input_mode() {
        InputMode::Discovered => "discovery",
        InputMode::ExplicitList => "explicit inputs",
    };
    println!("{}: submitting job ({})", plan.name, mode);

    let mut handle = if plan.uses_explicit_inputs {
        client
            .submit_open(&spec)
            .await
            .map_err(|e| StageError::new(plan.name, StageErrorKind::Submit, e))?
    } else {
        client
            .submit(&spec)
            .await
            .map_err(|e| StageError::new(plan.name, StageErrorKind::Submit, e))?
    };
    println!("{}: job {}", plan.name, handle.id());

    if plan.uses_explicit_inputs {
        client
            .add_inputs(&mut handle, &plan.explicit_inputs)
            .await
            .map_err(|e| StageError::new(plan.name, StageErrorKind::AddInputs, e))?;
    }

    client.wait(&mut handle).await.map_err(|e| match e {
        JobClientError::JobFailed { .. } => {
            StageError::new(plan.name, StageErrorKind::JobFailed, e)
        }
        other => StageError::new(plan.name, StageErrorKind::Wait, other),
    })?;

    println!("{}: done", plan.name);
    Ok(())
}
