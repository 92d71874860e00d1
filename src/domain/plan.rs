use crate::config::PipelineConfig;
use crate::domain::jobs::{InputMode, JobSpec};
use crate::domain::template::{CommandTemplate, TemplateError};
use std::path::Path;

/// Worker-local path of the current input, resolved remotely.
pub const INPUT_FILE: &str = "MANTA_INPUT_FILE";
/// Object name the current input came from, resolved remotely.
pub const INPUT_OBJECT: &str = "MANTA_INPUT_OBJECT";

pub const PROCESS_VIDEOS: &str = "ProcessVideos";
pub const GENERATE_WEBM: &str = "GenerateWebm";
pub const PROCESS_TRANSCRIPTS: &str = "ProcessTranscripts";
pub const AGGREGATE: &str = "Aggregate";

/// One pipeline stage, resolved against the run configuration.
#[derive(Debug, Clone)]
pub struct StagePlan {
    pub name: &'static str,
    pub enabled: bool,
    pub uses_explicit_inputs: bool,
    pub map: CommandTemplate,
    pub discovery: Option<CommandTemplate>,
    /// Remote object paths the job's workers fetch at run time
    pub assets: Vec<String>,
    /// Inputs injected into the open job, already rewritten to this
    /// stage's input convention, in operator order
    pub explicit_inputs: Vec<String>,
}

impl StagePlan {
    pub fn input_mode(&self) -> InputMode {
        if self.uses_explicit_inputs {
            InputMode::ExplicitList
        } else {
            InputMode::Discovered
        }
    }

    /// Build the job description submitted for this stage. An explicit-input
    /// job is submitted open and carries no discovery phase.
    pub fn to_spec(&self) -> JobSpec {
        JobSpec {
            name: self.name.to_string(),
            discovery_reduce: if self.uses_explicit_inputs {
                None
            } else {
                self.discovery.as_ref().map(|t| t.as_str().to_string())
            },
            map: self.map.as_str().to_string(),
            assets: self.assets.clone(),
            input_mode: self.input_mode(),
        }
    }
}

/// Resolve the configuration into the ordered stage plan. The order is
/// fixed: transcription, optional webm transcoding, race extraction, and
/// corpus-wide aggregation. Aggregation is defined only over the full
/// corpus, so an explicit video list disables it.
pub fn plan_stages(config: &PipelineConfig) -> Result<Vec<StagePlan>, TemplateError> {
    let explicit = !config.explicit_videos.is_empty();

    let toolchain_setup = format!("tar xzf /assets{} -C /var/tmp", config.toolchain_tarball);
    let discover_videos = CommandTemplate::new(
        format!("mfind -t o -n '\\.(mov|mp4)$' {}", config.video_source),
        &[],
    )?;

    let transcribe = script_path(config, "video-transcribe");
    let force = if config.force_retranscribe { " -f" } else { "" };
    let process_videos = StagePlan {
        name: PROCESS_VIDEOS,
        enabled: true,
        uses_explicit_inputs: explicit,
        map: CommandTemplate::new(
            format!(
                "{} && /assets{}{} -o {} \"${}\" \"${}\"",
                toolchain_setup, transcribe, force, config.output_location, INPUT_FILE, INPUT_OBJECT
            ),
            &[INPUT_FILE, INPUT_OBJECT],
        )?,
        discovery: Some(discover_videos.clone()),
        assets: vec![config.toolchain_tarball.clone(), transcribe],
        explicit_inputs: config.explicit_videos.clone(),
    };

    let webm = script_path(config, "video-webm");
    let generate_webm = StagePlan {
        name: GENERATE_WEBM,
        enabled: config.generate_webm,
        uses_explicit_inputs: explicit,
        map: CommandTemplate::new(
            format!(
                "/assets{} -o {} \"${}\" \"${}\"",
                webm, config.output_location, INPUT_FILE, INPUT_OBJECT
            ),
            &[INPUT_FILE, INPUT_OBJECT],
        )?,
        discovery: Some(discover_videos),
        assets: vec![webm],
        explicit_inputs: config.explicit_videos.clone(),
    };

    let extract = script_path(config, "transcript-races");
    let process_transcripts = StagePlan {
        name: PROCESS_TRANSCRIPTS,
        enabled: true,
        uses_explicit_inputs: explicit,
        map: CommandTemplate::new(
            format!(
                "{} && /assets{} -o {} \"${}\" \"${}\"",
                toolchain_setup, extract, config.output_location, INPUT_FILE, INPUT_OBJECT
            ),
            &[INPUT_FILE, INPUT_OBJECT],
        )?,
        discovery: Some(CommandTemplate::new(
            format!(
                "mfind -t o -n 'transcript\\.json$' {}",
                config.output_location
            ),
            &[],
        )?),
        assets: vec![config.toolchain_tarball.clone(), extract],
        explicit_inputs: config
            .explicit_videos
            .iter()
            .map(|video| transcript_object(&config.output_location, video))
            .collect(),
    };

    let aggregate_bin = script_path(config, "race-aggregate");
    let aggregate = StagePlan {
        name: AGGREGATE,
        enabled: !explicit,
        uses_explicit_inputs: false,
        map: CommandTemplate::new(
            format!(
                "/assets{} -o {}/summary.json \"${}\"",
                aggregate_bin, config.output_location, INPUT_FILE
            ),
            &[INPUT_FILE],
        )?,
        discovery: Some(CommandTemplate::new(
            format!("mfind -t o -n 'races\\.json$' {}", config.output_location),
            &[],
        )?),
        assets: vec![aggregate_bin],
        explicit_inputs: Vec::new(),
    };

    Ok(vec![
        process_videos,
        generate_webm,
        process_transcripts,
        aggregate,
    ])
}

fn script_path(config: &PipelineConfig, name: &str) -> String {
    format!("{}/{}", config.bin_root, name)
}

/// Transcript object a video's transcription writes, by the fixed naming
/// convention downstream stages rely on.
pub fn transcript_object(output_location: &str, video: &str) -> String {
    let stem = Path::new(video)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| video.to_string());
    format!("{}/{}/transcript.json", output_location, stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(videos: &[&str], webm: bool) -> PipelineConfig {
        PipelineConfig {
            output_location: String::from("/race/stor/out"),
            video_source: String::from("/race/stor/videos"),
            explicit_videos: videos.iter().map(|v| v.to_string()).collect(),
            generate_webm: webm,
            force_retranscribe: false,
            upload_assets: false,
            dry_run: false,
            asset_bundle: String::from("/race/public/racepipe/racepipe.tar.gz"),
            bin_root: String::from("/race/public/racepipe/bin"),
            toolchain_tarball: String::from("/race/public/racepipe/toolchain.tar.gz"),
            local_asset_dir: PathBuf::from("bin"),
        }
    }

    fn stage<'a>(plans: &'a [StagePlan], name: &str) -> &'a StagePlan {
        plans.iter().find(|p| p.name == name).unwrap()
    }

    #[test]
    fn test_explicit_videos_disable_aggregation() {
        let plans = plan_stages(&config(&["a.mov"], false)).unwrap();
        assert!(!stage(&plans, AGGREGATE).enabled);
    }

    #[test]
    fn test_discovery_mode_enables_aggregation_once() {
        let plans = plan_stages(&config(&[], false)).unwrap();
        let aggregates: Vec<_> = plans
            .iter()
            .filter(|p| p.name == AGGREGATE && p.enabled)
            .collect();
        assert_eq!(aggregates.len(), 1);
        assert!(plans
            .iter()
            .all(|p| p.input_mode() == InputMode::Discovered));
    }

    #[test]
    fn test_webm_stage_gated_by_flag() {
        let plans = plan_stages(&config(&[], false)).unwrap();
        assert!(!stage(&plans, GENERATE_WEBM).enabled);
        let plans = plan_stages(&config(&[], true)).unwrap();
        assert!(stage(&plans, GENERATE_WEBM).enabled);
    }

    #[test]
    fn test_explicit_transcript_inputs_follow_naming_convention() {
        let plans = plan_stages(&config(&["v1.mov", "v2.mov"], false)).unwrap();
        assert_eq!(
            stage(&plans, PROCESS_TRANSCRIPTS).explicit_inputs,
            vec![
                "/race/stor/out/v1/transcript.json",
                "/race/stor/out/v2/transcript.json"
            ]
        );
    }

    #[test]
    fn test_explicit_spec_has_no_discovery_phase() {
        let plans = plan_stages(&config(&["v1.mov"], false)).unwrap();
        let spec = stage(&plans, PROCESS_VIDEOS).to_spec();
        assert_eq!(spec.input_mode, InputMode::ExplicitList);
        assert!(spec.discovery_reduce.is_none());
    }

    #[test]
    fn test_discovered_spec_carries_discovery_phase() {
        let plans = plan_stages(&config(&[], false)).unwrap();
        let spec = stage(&plans, PROCESS_VIDEOS).to_spec();
        assert_eq!(spec.input_mode, InputMode::Discovered);
        assert!(spec
            .discovery_reduce
            .unwrap()
            .contains("/race/stor/videos"));
    }

    #[test]
    fn test_toolchain_only_shipped_to_stages_that_need_it() {
        let plans = plan_stages(&config(&[], true)).unwrap();
        let toolchain = "/race/public/racepipe/toolchain.tar.gz".to_string();
        assert!(stage(&plans, PROCESS_VIDEOS).assets.contains(&toolchain));
        assert!(stage(&plans, PROCESS_TRANSCRIPTS)
            .assets
            .contains(&toolchain));
        assert!(!stage(&plans, GENERATE_WEBM).assets.contains(&toolchain));
        assert!(!stage(&plans, AGGREGATE).assets.contains(&toolchain));
    }

    #[test]
    fn test_force_retranscribe_reaches_the_map_command() {
        let mut cfg = config(&[], false);
        cfg.force_retranscribe = true;
        let plans = plan_stages(&cfg).unwrap();
        assert!(stage(&plans, PROCESS_VIDEOS)
            .map
            .as_str()
            .contains("video-transcribe -f"));
    }

    #[test]
    fn test_transcript_object_strips_the_extension() {
        assert_eq!(
            transcript_object("/out", "race-day-2.mov"),
            "/out/race-day-2/transcript.json"
        );
    }
}
