use crate::ports::storage::RemoteStorePort;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug)]
pub enum PublishError {
    Archive(io::Error),
    Upload(String),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Archive(e) => write!(f, "failed to bundle assets: {}", e),
            PublishError::Upload(e) => write!(f, "failed to upload asset bundle: {}", e),
        }
    }
}

impl std::error::Error for PublishError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PublishError::Archive(e) => Some(e),
            PublishError::Upload(_) => None,
        }
    }
}

impl From<io::Error> for PublishError {
    fn from(err: io::Error) -> Self {
        PublishError::Archive(err)
    }
}

/// Bundle the files directly under `local_dir` (flat, no recursion) into a
/// gzip'd tar and upload it to `remote_bundle`. Unpacking is the remote
/// side's responsibility. The temporary archive lives only for the duration
/// of this call; the named-temp-file guard removes it on success and on
/// every error path.
pub async fn publish<S: RemoteStorePort>(
    store: &S,
    local_dir: &Path,
    remote_bundle: &str,
) -> Result<(), PublishError> {
    let bundle = NamedTempFile::new()?;
    write_bundle(local_dir, bundle.as_file())?;
    store
        .put(bundle.path(), remote_bundle)
        .await
        .map_err(|e| PublishError::Upload(e.to_string()))?;
    Ok(())
}

fn write_bundle(local_dir: &Path, out: &File) -> io::Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut archive = tar::Builder::new(encoder);

    let mut entries = fs::read_dir(local_dir)?.collect::<io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        if path.is_file() {
            archive.append_path_with_name(&path, entry.file_name())?;
        }
    }

    archive.into_inner()?.finish()?;
    Ok(())
}
