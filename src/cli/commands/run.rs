//! Default command: run the whole pipeline for one request.

use crate::agent::OpenAiAgent;
use crate::cli::preflight::{self, Operation};
use crate::cli::{Output, StatusReporter};
use crate::config::{Prompts, Settings};
use crate::pipeline::{Pipeline, PipelineRequest, RunTrace, DEFAULT_QUERY};
use crate::transcription::AudioTranscriber;
use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

/// Arguments for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub query: Option<String>,
    pub video: Option<String>,
    pub max_duration: u32,
    pub pretty: bool,
}

/// Run the pipeline and print its report.
///
/// Exits the process with status 1 when the provider credential is missing.
/// Failures inside the pipeline only shape the report.
pub async fn run_pipeline(args: RunArgs, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Pipeline) {
        Output::error(&e.to_string());
        Output::info("Run 'stepreel doctor' for detailed diagnostics.");
        std::process::exit(1);
    }

    let videos_dir = settings.videos_dir();
    std::fs::create_dir_all(&videos_dir)?;

    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;

    let mut request =
        PipelineRequest::new(args.query.as_deref().unwrap_or(DEFAULT_QUERY)).with_max_duration(args.max_duration);
    if let Some(video) = &args.video {
        request = request.with_video(video.clone());
    }

    let (trace, events) = RunTrace::channel();
    let reporter = StatusReporter::new(args.pretty).spawn(events);
    debug!("Run {} writing to {}", trace.run_id(), videos_dir.display());

    let agent = OpenAiAgent::from_settings(&settings, prompts)
        .with_variable("max_duration", args.max_duration.to_string())
        .with_trace(trace.clone());
    let transcriber = AudioTranscriber::from_settings(&settings);
    let pipeline = Pipeline::from_settings(&settings, Arc::new(agent), Arc::new(transcriber))
        .with_trace(trace);

    let report = pipeline.run(&request).await;

    // The reporter stops once every trace handle is gone.
    drop(pipeline);
    if let Err(e) = reporter.await {
        debug!("Status reporter ended abnormally: {}", e);
    }

    Output::header("Result");
    println!("{}", report);
    println!();

    if report.is_complete() {
        Output::success("Highlight video created.");
    } else {
        Output::warning("The run stopped early; the report above shows what was produced.");
    }

    Ok(())
}
