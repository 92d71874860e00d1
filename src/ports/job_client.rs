use crate::domain::jobs::{JobHandle, JobSpec, StateViolation};
use async_trait::async_trait;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum JobClientError {
    /// The service's CLI tool could not be spawned
    Spawn(io::Error),
    /// The tool ran and exited nonzero
    ToolFailed { tool: &'static str, stderr: String },
    /// The tool's output was not understood
    Parse(String),
    /// An operation was attempted in the wrong handle state
    InvalidState(StateViolation),
    /// The job reached a terminal state with failures
    JobFailed { errors: u64 },
    /// The operator interrupted the wait
    Interrupted,
}

impl fmt::Display for JobClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobClientError::Spawn(e) => write!(f, "failed to spawn remote tool: {}", e),
            JobClientError::ToolFailed { tool, stderr } => {
                write!(f, "{} failed: {}", tool, stderr)
            }
            JobClientError::Parse(e) => write!(f, "unexpected tool output: {}", e),
            JobClientError::InvalidState(e) => write!(f, "{}", e),
            JobClientError::JobFailed { errors } => {
                write!(f, "job finished with {} task error(s)", errors)
            }
            JobClientError::Interrupted => write!(f, "interrupted while waiting for the job"),
        }
    }
}

impl std::error::Error for JobClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobClientError::Spawn(e) => Some(e),
            JobClientError::InvalidState(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for JobClientError {
    fn from(err: io::Error) -> Self {
        JobClientError::Spawn(err)
    }
}

impl From<StateViolation> for JobClientError {
    fn from(err: StateViolation) -> Self {
        JobClientError::InvalidState(err)
    }
}

/// Interface to the remote execution service, as the stage runner needs it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobClientPort: Send + Sync {
    /// Submit a closed job; its discovery phase enumerates inputs remotely.
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle, JobClientError>;

    /// Submit an open job that accepts explicit inputs.
    async fn submit_open(&self, spec: &JobSpec) -> Result<JobHandle, JobClientError>;

    /// Inject inputs into an open job, preserving the given order.
    async fn add_inputs(
        &self,
        handle: &mut JobHandle,
        inputs: &[String],
    ) -> Result<(), JobClientError>;

    /// Close the job if it is still open, then block until it reaches a
    /// terminal state. Success means every task succeeded.
    async fn wait(&self, handle: &mut JobHandle) -> Result<(), JobClientError>;
}
