use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use github_binary_upload::cli::Args;
use github_binary_upload::config::Config;
use github_binary_upload::error::exit_code_for;
use github_binary_upload::github::ReleaseClient;
use github_binary_upload::publisher::Publisher;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    let invocation = args.resolve(&config)?;
    tracing::debug!("Resolved settings: {:?}", invocation.settings);

    let client = ReleaseClient::new(
        &invocation.settings.server,
        invocation.credentials,
        invocation.settings.timeout,
    )?
    .with_mime_probe(invocation.settings.mime_probe);

    let report = Publisher::new(&client).publish(&invocation.request).await?;
    tracing::debug!("Publish report: {:?}", report);

    Ok(())
}
