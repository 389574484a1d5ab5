//! Stepreel CLI entry point.

use anyhow::Result;
use clap::Parser;
use stepreel::cli::commands::{self, RunArgs};
use stepreel::cli::{Cli, Commands};
use stepreel::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(cli.config.as_ref())?;

    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("stepreel={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Doctor) => commands::run_doctor(&settings).await?,
        Some(Commands::Transcribe { audio }) => commands::run_transcribe(&audio, settings).await?,
        None => {
            let args = RunArgs {
                query: cli.query,
                video: cli.video,
                max_duration: cli.max_duration,
                pretty: !cli.no_pretty,
            };
            commands::run_pipeline(args, settings).await?;
        }
    }

    Ok(())
}
