use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod agent;
mod config;
mod dataset;
mod evaluation;
mod models;
mod output;
mod runner;
mod scoring;

use crate::config::Config;
use crate::output::OutputFormat;
use crate::runner::Runner;

/// Marketing concierge evaluation CLI - Score the agent against golden scenarios
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML run configuration
    run_file: PathBuf,

    /// Output format: plain or json
    #[arg(short, long, default_value = "plain")]
    output: OutputFormat,

    /// Verbose output - log component scores for every scenario
    #[arg(short, long)]
    verbose: bool,

    /// Golden dataset to use instead of the configured one
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Results file to write instead of the configured one
    #[arg(long)]
    results: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::from_file(&args.run_file)?;
    let dataset_path = args.dataset.unwrap_or_else(|| config.dataset_path.clone());
    let results_path = args.results.unwrap_or_else(|| config.results_path.clone());

    let scenarios = dataset::load_scenarios(&dataset_path)?;
    let agent = agent::from_config(&config.agent)?;
    let mut runner =
        Runner::new(agent, config.agent_timeout()).with_rate_limit(config.rate_limit_rps);

    let report = runner.run_scenarios(&scenarios).await;
    runner::store_results(&report.results, &results_path)?;

    output::print_report(&report, args.output);

    evaluation::check_pass_rate(&report.summary)
}
