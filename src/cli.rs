//! Command-line surface and preflight checks.

use crate::config::{env_or, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Exit code for usage errors, the same one clap uses for bad flags.
pub const USAGE_EXIT: i32 = 2;

/// Submit the race-video analysis pipeline to the remote compute service.
#[derive(Debug, Parser)]
#[command(name = "racepipe", version)]
pub struct Cli {
    /// Remote location the helper-script bundle is uploaded to
    #[arg(short = 'a', long = "asset-bundle", value_name = "PATH")]
    pub asset_bundle: Option<String>,

    /// Remote directory to discover source videos from
    #[arg(short = 's', long = "video-source", value_name = "DIR")]
    pub video_source: Option<String>,

    /// Also generate a webm rendition of each video
    #[arg(short = 'w', long = "webm")]
    pub webm: bool,

    /// Remote location of the analysis toolchain tarball
    #[arg(short = 't', long = "toolchain", value_name = "PATH")]
    pub toolchain: Option<String>,

    /// Re-transcribe videos that already have a transcript
    #[arg(short = 'f', long = "force-retranscribe")]
    pub force_retranscribe: bool,

    /// Upload the local helper scripts before running any stage
    #[arg(short = 'u', long = "upload-assets")]
    pub upload_assets: bool,

    /// Print the planned jobs without submitting anything
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Remote directory all stage outputs are written under
    #[arg(value_name = "OUTPUT_LOCATION")]
    pub output_location: String,

    /// Specific videos to process instead of discovering them.
    /// Skips the final aggregation, which covers the full corpus only.
    #[arg(value_name = "VIDEO")]
    pub videos: Vec<String>,
}

impl Cli {
    /// Resolve flags against the environment defaults into the immutable
    /// run configuration.
    pub fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            output_location: self.output_location,
            video_source: self
                .video_source
                .unwrap_or_else(|| env_or("RACEPIPE_VIDEO_SOURCE", "/race/stor/videos")),
            explicit_videos: self.videos,
            generate_webm: self.webm,
            force_retranscribe: self.force_retranscribe,
            upload_assets: self.upload_assets,
            dry_run: self.dry_run,
            asset_bundle: self.asset_bundle.unwrap_or_else(|| {
                env_or(
                    "RACEPIPE_ASSET_BUNDLE",
                    "/race/public/racepipe/racepipe.tar.gz",
                )
            }),
            bin_root: env_or("RACEPIPE_BIN_ROOT", "/race/public/racepipe/bin"),
            toolchain_tarball: self.toolchain.unwrap_or_else(|| {
                env_or(
                    "RACEPIPE_TOOLCHAIN",
                    "/race/public/racepipe/toolchain.tar.gz",
                )
            }),
            local_asset_dir: PathBuf::from(env_or("RACEPIPE_LOCAL_ASSETS", "bin")),
        }
    }
}

/// The pipeline drives the remote service through its CLI tools; a missing
/// tool is a usage problem, reported before any stage runs.
pub fn ensure_remote_tools() -> Result<(), String> {
    for tool in ["mjob", "mput"] {
        let status = Command::new(tool)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if status.is_err() {
            return Err(format!("required tool {} not found on PATH", tool));
        }
    }
    Ok(())
}
