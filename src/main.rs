use anyhow::Result;
use clap::Parser;
use magi_rs::cli::Args;
use magi_rs::generator::outlet;
use magi_rs::generator::progress::ConsoleProgress;
use magi_rs::launch;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG 优先，其次由 --verbose 决定默认级别
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let question = args.question.clone();
    let output = args.output.clone();
    let report_options = args.report_options();
    let config = args.into_config()?;

    let state = launch(&config, &question, Arc::new(ConsoleProgress)).await?;
    outlet::save(&state, output, &report_options).await
}
