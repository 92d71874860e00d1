use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;

// Trait over the remote service's CLI tools so the adapters can be tested
// without spawning them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobToolRunner: Send + Sync {
    async fn job_create(&self, args: &[String]) -> io::Result<Output>;
    async fn job_add_inputs(&self, job_id: &str, inputs: &[String]) -> io::Result<Output>;
    async fn job_close(&self, job_id: &str) -> io::Result<Output>;
    async fn job_watch(&self, job_id: &str) -> io::Result<Output>;
    async fn job_get(&self, job_id: &str) -> io::Result<Output>;
    async fn put(&self, local_path: &Path, remote_path: &str) -> io::Result<Output>;
}

pub struct RealJobToolRunner;

#[async_trait]
impl JobToolRunner for RealJobToolRunner {
    async fn job_create(&self, args: &[String]) -> io::Result<Output> {
        TokioCommand::new("mjob")
            .arg("create")
            .args(args)
            .output()
            .await
    }

    async fn job_add_inputs(&self, job_id: &str, inputs: &[String]) -> io::Result<Output> {
        let mut child = TokioCommand::new("mjob")
            .arg("addinputs")
            .arg(job_id)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Input names go in on stdin, newline-delimited, in the order given.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "no stdin for addinputs"))?;
        for name in inputs {
            stdin.write_all(name.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
        }
        drop(stdin);

        child.wait_with_output().await
    }

    async fn job_close(&self, job_id: &str) -> io::Result<Output> {
        TokioCommand::new("mjob")
            .arg("close")
            .arg(job_id)
            .output()
            .await
    }

    async fn job_watch(&self, job_id: &str) -> io::Result<Output> {
        // Watching blocks until the job reaches a terminal state, with no
        // timeout. Raced against Ctrl-C so an operator can abort a stuck
        // pipeline.
        let child = TokioCommand::new("mjob")
            .arg("watch")
            .arg(job_id)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let finished = child.wait_with_output();
        tokio::select! {
            output = finished => output,
            _ = tokio::signal::ctrl_c() => Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "interrupted while watching job",
            )),
        }
    }

    async fn job_get(&self, job_id: &str) -> io::Result<Output> {
        TokioCommand::new("mjob")
            .arg("get")
            .arg(job_id)
            .output()
            .await
    }

    async fn put(&self, local_path: &Path, remote_path: &str) -> io::Result<Output> {
        TokioCommand::new("mput")
            .arg("-f")
            .arg(local_path)
            .arg(remote_path)
            .output()
            .await
    }
}
