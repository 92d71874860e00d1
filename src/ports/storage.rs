use async_trait::async_trait;
use std::error::Error;
use std::path::Path;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStorePort: Send + Sync {
    /// Upload a local file to a remote object path
    async fn put(
        &self,
        local_path: &Path,
        remote_path: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
