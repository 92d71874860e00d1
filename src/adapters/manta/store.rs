use crate::adapters::manta::cmd::JobToolRunner;
use crate::ports::storage::RemoteStorePort;
use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

/// MantaStore implements RemoteStorePort via the service's `mput` tool.
pub struct MantaStore<R> {
    runner: R,
}

impl<R: JobToolRunner> MantaStore<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl<R: JobToolRunner> RemoteStorePort for MantaStore<R> {
    async fn put(
        &self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        let output = self.runner.put(local_path, remote_path).await?;
        if !output.status.success() {
            return Err(format!(
                "mput {}: {}",
                remote_path,
                String::from_utf8_lossy(&output.stderr).trim()
            )
            .into());
        }
        Ok(())
    }
}
