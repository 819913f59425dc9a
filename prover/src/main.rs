mod config;
mod dataset;
mod errors;
mod models;
mod pipeline;
mod state;
mod toolchain;
mod workdir;

use crate::config::{Args, PipelineConfig};
use crate::dataset::Dataset;
use crate::pipeline::Pipeline;
use crate::toolchain::CliToolchain;
use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use zk_proofs::poseidon::CircomPoseidon;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = PipelineConfig::from(&args);

    let dataset = match Dataset::load(&args.dataset) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!(path = %args.dataset.display(), error = %e, "could not read dataset");
            return ExitCode::FAILURE;
        }
    };

    let hasher = match CircomPoseidon::new() {
        Ok(hasher) => hasher,
        Err(e) => {
            error!(error = %e, "could not initialise the Poseidon hasher");
            return ExitCode::FAILURE;
        }
    };

    let toolchain = CliToolchain::new(config.tools.clone());
    let mut pipeline = Pipeline::new(config, toolchain, hasher);

    match pipeline.run(&dataset).await {
        Ok(report) => {
            info!(
                run_id = %report.run_id,
                authentic = report.verdict.authentic,
                unique = ?report.verdict.unique,
                report = %pipeline.dirs().run_report().display(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!(stage = %failure.stage, error = %failure, "proof run aborted");
            ExitCode::FAILURE
        }
    }
}
