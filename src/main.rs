//! Racepipe binary: resolve the CLI into a run configuration, wire the
//! remote-service adapters, and run the pipeline.
//!
//! Exit codes: 0 on success, 1 on any publish/stage failure, 2 on usage
//! errors (bad flags or missing remote tools).

use clap::Parser;
use dotenv::dotenv;
use racepipe::adapters::manta::{MantaJobClient, MantaStore, RealJobToolRunner};
use racepipe::application::pipeline::PipelineService;
use racepipe::cli::{self, Cli};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = cli.into_config();

    if !config.dry_run {
        if let Err(e) = cli::ensure_remote_tools() {
            eprintln!("racepipe: {}", e);
            std::process::exit(cli::USAGE_EXIT);
        }
    }

    let client = MantaJobClient::new(RealJobToolRunner);
    let store = MantaStore::new(RealJobToolRunner);
    let service = PipelineService::new(client, store, config);

    if let Err(e) = service.run().await {
        eprintln!("racepipe: {}", e);
        std::process::exit(1);
    }
}
