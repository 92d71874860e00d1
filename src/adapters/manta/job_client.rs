use crate::adapters::manta::cmd::JobToolRunner;
use crate::domain::jobs::{JobHandle, JobOutcome, JobSpec};
use crate::ports::job_client::{JobClientError, JobClientPort};
use async_trait::async_trait;
use std::process::Output;

/// MantaJobClient implements JobClientPort on top of the service's CLI
/// tools (`mjob`), through a JobToolRunner.
pub struct MantaJobClient<R> {
    runner: R,
}

impl<R: JobToolRunner> MantaJobClient<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn create(&self, spec: &JobSpec, open: bool) -> Result<String, JobClientError> {
        let args = create_args(spec, open);
        let output = self.runner.job_create(&args).await?;
        ensure_success("mjob create", &output)?;
        parse_job_id(&output)
    }
}

fn create_args(spec: &JobSpec, open: bool) -> Vec<String> {
    // -q prints only the job id. Phases run in argument order, so the
    // discovery lister (a reduce-only phase) precedes the map phase.
    let mut args = vec![String::from("-q")];
    if open {
        args.push(String::from("--open"));
    }
    for asset in &spec.assets {
        args.push(String::from("-s"));
        args.push(asset.clone());
    }
    if let Some(discovery) = &spec.discovery_reduce {
        args.push(String::from("-r"));
        args.push(discovery.clone());
    }
    args.push(String::from("-m"));
    args.push(spec.map.clone());
    args
}

fn ensure_success(tool: &'static str, output: &Output) -> Result<(), JobClientError> {
    if output.status.success() {
        Ok(())
    } else {
        Err(JobClientError::ToolFailed {
            tool,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn parse_job_id(output: &Output) -> Result<String, JobClientError> {
    let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if id.is_empty() {
        return Err(JobClientError::Parse(String::from(
            "mjob create printed no job id",
        )));
    }
    Ok(id)
}

#[async_trait]
impl<R: JobToolRunner> JobClientPort for MantaJobClient<R> {
    async fn submit(&self, spec: &JobSpec) -> Result<JobHandle, JobClientError> {
        let id = self.create(spec, false).await?;
        Ok(JobHandle::running(id))
    }

    async fn submit_open(&self, spec: &JobSpec) -> Result<JobHandle, JobClientError> {
        let id = self.create(spec, true).await?;
        Ok(JobHandle::open(id))
    }

    async fn add_inputs(
        &self,
        handle: &mut JobHandle,
        inputs: &[String],
    ) -> Result<(), JobClientError> {
        handle.check_accepting()?;
        let output = self.runner.job_add_inputs(handle.id(), inputs).await?;
        ensure_success("mjob addinputs", &output)
    }

    async fn wait(&self, handle: &mut JobHandle) -> Result<(), JobClientError> {
        handle.check_waitable()?;

        if handle.is_open() {
            let output = self.runner.job_close(handle.id()).await?;
            ensure_success("mjob close", &output)?;
            handle.close()?;
        }

        let output = self.runner.job_watch(handle.id()).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::Interrupted {
                JobClientError::Interrupted
            } else {
                JobClientError::Spawn(e)
            }
        })?;
        ensure_success("mjob watch", &output)?;

        let output = self.runner.job_get(handle.id()).await?;
        ensure_success("mjob get", &output)?;
        let record: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| JobClientError::Parse(format!("bad job record: {}", e)))?;

        let state = record.get("state").and_then(|v| v.as_str()).unwrap_or("");
        let cancelled = record
            .get("cancelled")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let errors = record
            .pointer("/stats/errors")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        if state == "done" && !cancelled && errors == 0 {
            handle.finish(JobOutcome::Succeeded)?;
            Ok(())
        } else {
            handle.finish(JobOutcome::Failed)?;
            Err(JobClientError::JobFailed { errors })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::manta::cmd::MockJobToolRunner;
    use crate::domain::jobs::{InputMode, JobState};
    use std::os::unix::process::ExitStatusExt;
    use std::process::ExitStatus;

    fn spec() -> JobSpec {
        JobSpec {
            name: String::from("ProcessVideos"),
            discovery_reduce: Some(String::from("mfind -t o -n '\\.mov$' /race/stor/videos")),
            map: String::from("transcribe \"$MANTA_INPUT_FILE\""),
            assets: vec![String::from("/race/public/racepipe/bin/video-transcribe")],
            input_mode: InputMode::Discovered,
        }
    }

    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        Output {
            status: ExitStatus::from_raw(code),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[tokio::test]
    async fn test_submit_parses_job_id_and_orders_phases() {
        let mut runner = MockJobToolRunner::new();
        runner
            .expect_job_create()
            .withf(|args: &[String]| {
                let r = args.iter().position(|a| a == "-r");
                let m = args.iter().position(|a| a == "-m");
                args.contains(&String::from("-q"))
                    && !args.contains(&String::from("--open"))
                    && r.is_some()
                    && r < m
            })
            .returning(|_| Ok(output(0, "7b39ca66-1f0a-4c7e\n", "")));

        let client = MantaJobClient::new(runner);
        let handle = client.submit(&spec()).await.unwrap();
        assert_eq!(handle.id(), "7b39ca66-1f0a-4c7e");
        assert_eq!(handle.state(), JobState::Running);
    }

    #[tokio::test]
    async fn test_submit_open_leaves_the_handle_accepting() {
        let mut runner = MockJobToolRunner::new();
        runner
            .expect_job_create()
            .withf(|args: &[String]| args.contains(&String::from("--open")))
            .returning(|_| Ok(output(0, "job-1\n", "")));

        let client = MantaJobClient::new(runner);
        let handle = client.submit_open(&spec()).await.unwrap();
        assert!(handle.is_open());
    }

    #[tokio::test]
    async fn test_create_failure_is_a_tool_error() {
        let mut runner = MockJobToolRunner::new();
        runner
            .expect_job_create()
            .returning(|_| Ok(output(1 << 8, "", "mjob: AccountBlocked")));

        let client = MantaJobClient::new(runner);
        let err = client.submit(&spec()).await.unwrap_err();
        match err {
            JobClientError::ToolFailed { tool, stderr } => {
                assert_eq!(tool, "mjob create");
                assert_eq!(stderr, "mjob: AccountBlocked");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_inputs_requires_an_open_handle() {
        // The runner must never be reached with a closed handle.
        let runner = MockJobToolRunner::new();
        let client = MantaJobClient::new(runner);
        let mut handle = JobHandle::running("job-1");
        let err = client
            .add_inputs(&mut handle, &[String::from("a.mov")])
            .await
            .unwrap_err();
        assert!(matches!(err, JobClientError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_wait_closes_an_open_job_before_watching() {
        let mut runner = MockJobToolRunner::new();
        runner
            .expect_job_close()
            .withf(|id: &str| id == "job-1")
            .times(1)
            .returning(|_| Ok(output(0, "", "")));
        runner
            .expect_job_watch()
            .times(1)
            .returning(|_| Ok(output(0, "", "")));
        runner.expect_job_get().times(1).returning(|_| {
            Ok(output(
                0,
                r#"{"state":"done","cancelled":false,"stats":{"errors":0,"tasksDone":2}}"#,
                "",
            ))
        });

        let client = MantaJobClient::new(runner);
        let mut handle = JobHandle::open("job-1");
        client.wait(&mut handle).await.unwrap();
        assert_eq!(handle.state(), JobState::Done(JobOutcome::Succeeded));
    }

    #[tokio::test]
    async fn test_wait_reports_task_errors_as_job_failure() {
        let mut runner = MockJobToolRunner::new();
        runner
            .expect_job_watch()
            .returning(|_| Ok(output(0, "", "")));
        runner.expect_job_get().returning(|_| {
            Ok(output(
                0,
                r#"{"state":"done","cancelled":false,"stats":{"errors":3}}"#,
                "",
            ))
        });

        let client = MantaJobClient::new(runner);
        let mut handle = JobHandle::running("job-2");
        let err = client.wait(&mut handle).await.unwrap_err();
        assert!(matches!(err, JobClientError::JobFailed { errors: 3 }));
        assert_eq!(handle.state(), JobState::Done(JobOutcome::Failed));
    }

    #[tokio::test]
    async fn test_wait_twice_is_a_state_violation() {
        let mut runner = MockJobToolRunner::new();
        runner
            .expect_job_watch()
            .times(1)
            .returning(|_| Ok(output(0, "", "")));
        runner.expect_job_get().times(1).returning(|_| {
            Ok(output(
                0,
                r#"{"state":"done","cancelled":false,"stats":{"errors":0}}"#,
                "",
            ))
        });

        let client = MantaJobClient::new(runner);
        let mut handle = JobHandle::running("job-3");
        client.wait(&mut handle).await.unwrap();
        let err = client.wait(&mut handle).await.unwrap_err();
        assert!(matches!(err, JobClientError::InvalidState(_)));
    }
}
