use serde::{Deserialize, Serialize};
use std::fmt;

/// How a job receives its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// The job's leading discovery phase enumerates inputs remotely
    Discovered,
    /// The job is submitted open and inputs are injected explicitly
    ExplicitList,
}

/// Declarative description of one remote job, handed to the job client.
/// Built fresh per stage invocation and discarded once the job id is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Stage name, for operator output
    pub name: String,
    /// Optional leading reduce phase that lists the job's inputs
    pub discovery_reduce: Option<String>,
    /// Map phase command, placeholders resolved on the worker
    pub map: String,
    /// Remote object paths the workers must be able to fetch
    pub assets: Vec<String>,
    pub input_mode: InputMode,
}

/// Terminal result of a remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Accepting explicit inputs
    Open,
    /// Inputs closed, job in flight
    Running,
    Done(JobOutcome),
}

impl JobState {
    fn describe(&self) -> &'static str {
        match self {
            JobState::Open => "open",
            JobState::Running => "running",
            JobState::Done(JobOutcome::Succeeded) => "done",
            JobState::Done(JobOutcome::Failed) => "failed",
        }
    }
}

/// A transition attempted in the wrong state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateViolation {
    pub job_id: String,
    pub action: &'static str,
    pub state: JobState,
}

impl fmt::Display for StateViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "job {}: cannot {} while {}",
            self.job_id,
            self.action,
            self.state.describe()
        )
    }
}

impl std::error::Error for StateViolation {}

/// Handle to a submitted job, owned by the stage runner for the duration of
/// one stage. Tracks the open-job protocol explicitly: inputs may only be
/// added while `Open`, the first wait closes an open job, and a terminal
/// handle accepts nothing further.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: String,
    state: JobState,
}

impl JobHandle {
    /// Handle for a job submitted open (accepting inputs).
    pub fn open(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: JobState::Open,
        }
    }

    /// Handle for a job submitted closed (discovery enumerates inputs).
    pub fn running(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: JobState::Running,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == JobState::Open
    }

    fn violation(&self, action: &'static str) -> StateViolation {
        StateViolation {
            job_id: self.id.clone(),
            action,
            state: self.state,
        }
    }

    /// Inputs may only be injected while the job is open.
    pub fn check_accepting(&self) -> Result<(), StateViolation> {
        match self.state {
            JobState::Open => Ok(()),
            _ => Err(self.violation("add inputs")),
        }
    }

    /// Waiting is valid until the job reaches a terminal state.
    pub fn check_waitable(&self) -> Result<(), StateViolation> {
        match self.state {
            JobState::Open | JobState::Running => Ok(()),
            JobState::Done(_) => Err(self.violation("wait")),
        }
    }

    /// Open -> Running.
    pub fn close(&mut self) -> Result<(), StateViolation> {
        match self.state {
            JobState::Open => {
                self.state = JobState::Running;
                Ok(())
            }
            _ => Err(self.violation("close")),
        }
    }

    /// Running -> Done.
    pub fn finish(&mut self, outcome: JobOutcome) -> Result<(), StateViolation> {
        match self.state {
            JobState::Running => {
                self.state = JobState::Done(outcome);
                Ok(())
            }
            _ => Err(self.violation("finish")),
        }
    }
}
