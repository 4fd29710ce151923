use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use change3d::{run_experiment, RunArgs};

#[derive(Parser, Debug)]
#[command(name = "change3d", about = "Train and test a 2D/3D change-detection network")]
struct Cli {
    /// Experiment name: reads `<config-dir>/<name>.yaml`.
    #[arg(short = 'c', long, default_value = "config")]
    config_name: String,
    #[arg(short = 'w', long, default_value = "2")]
    num_workers: usize,
    /// Per-batch test scores and debug logging.
    #[arg(short, long)]
    verbose: bool,
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let args = RunArgs {
        config_dir: cli.config_dir,
        results_dir: cli.results_dir,
        name: cli.config_name,
        num_workers: cli.num_workers,
        verbose: cli.verbose,
        argv: std::env::args().collect(),
    };
    let summary = run_experiment(&args)?;
    tracing::info!(
        f1 = summary.test.f1 * 100.0,
        crmse = summary.test.crmse,
        "Done"
    );
    Ok(())
}
