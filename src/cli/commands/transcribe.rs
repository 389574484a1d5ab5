//! Transcribe command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcription::{AudioTranscriber, TranscriptionService};
use anyhow::Result;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;

/// Transcribe one audio file and write its transcript sidecar.
pub async fn run_transcribe(audio: &Path, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Transcribe) {
        Output::error(&e.to_string());
        Output::info("Run 'stepreel doctor' for detailed diagnostics.");
        std::process::exit(1);
    }

    Output::info(&format!("Transcribing: {}", audio.display()));

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Converting and uploading audio...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let transcriber = AudioTranscriber::from_settings(&settings);
    let result = transcriber.process_audio(audio).await;
    spinner.finish_and_clear();

    let artifact = match result {
        Ok(artifact) => artifact,
        Err(e) => {
            Output::error(&format!("Transcription failed: {}", e));
            return Err(e.into());
        }
    };

    Output::header("Transcript");
    println!("{}", artifact.record.transcript);

    Output::header("Key points");
    if artifact.record.key_points.is_empty() {
        println!("  (No key points identified)");
    }
    for point in &artifact.record.key_points {
        Output::list_item(point);
    }

    println!();
    Output::success(&format!("Saved transcript to {}", artifact.json_path.display()));

    Ok(())
}
