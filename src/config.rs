//! Run configuration.

use std::env;
use std::path::PathBuf;

/// Configuration for one pipeline run. Built once from CLI input plus
/// environment defaults, read-only afterwards.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Remote directory all stage outputs are written under
    pub output_location: String,
    /// Remote directory videos are discovered from
    pub video_source: String,
    /// Specific videos to process instead of discovering them.
    /// Non-empty implies the aggregation stage never runs.
    pub explicit_videos: Vec<String>,
    /// Enable the optional webm transcoding stage
    pub generate_webm: bool,
    /// Passed through to the transcriber: redo existing transcripts
    pub force_retranscribe: bool,
    /// Publish the local helper scripts before stage 1
    pub upload_assets: bool,
    /// Print the planned jobs without submitting anything
    pub dry_run: bool,
    /// Remote object path the helper-script bundle is uploaded to
    pub asset_bundle: String,
    /// Remote directory the helper scripts live under
    pub bin_root: String,
    /// Remote object path of the analysis toolchain tarball
    pub toolchain_tarball: String,
    /// Local directory the asset publisher archives
    pub local_asset_dir: PathBuf,
}

/// Read an environment default, falling back to a fixed value.
pub fn env_or(var: &str, fallback: &str) -> String {
    env::var(var).unwrap_or_else(|_| String::from(fallback))
}
