//! Convert, transcribe, flag and persist one audio file.

use super::key_points::extract_key_points;
use super::models::{format_transcript, TranscriptArtifact, TranscriptRecord};
use super::store::persist_transcript;
use super::whisper::WhisperClient;
use super::TranscriptionService;
use crate::config::Settings;
use crate::error::{Result, StepreelError};
use crate::media::{convert_for_transcription, ConversionOptions, ToolRunner};
use async_trait::async_trait;
use std::path::Path;
use tracing::{info, instrument, warn};

/// The production [`TranscriptionService`]: ffmpeg conversion, then Whisper.
pub struct AudioTranscriber {
    whisper: WhisperClient,
    runner: ToolRunner,
    options: ConversionOptions,
}

impl AudioTranscriber {
    pub fn new(whisper: WhisperClient, runner: ToolRunner, options: ConversionOptions) -> Self {
        Self {
            whisper,
            runner,
            options,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            WhisperClient::new(&settings.transcription.model),
            ToolRunner::from_settings(&settings.media),
            ConversionOptions::from(&settings.transcription),
        )
    }
}

#[async_trait]
impl TranscriptionService for AudioTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn process_audio(&self, audio_path: &Path) -> Result<TranscriptArtifact> {
        if !audio_path.exists() {
            return Err(StepreelError::MissingArtifact(audio_path.to_path_buf()));
        }

        let segments = {
            // The scratch directory is removed when this block ends, on
            // success and on every `?` alike.
            let scratch = convert_for_transcription(&self.runner, audio_path, &self.options).await?;
            self.whisper.transcribe_segments(scratch.path()).await?
        };

        if segments.is_empty() {
            warn!("Transcription returned no speech");
        }

        let transcript = format_transcript(&segments);
        let key_points = extract_key_points(&transcript);
        info!(
            "Transcribed {} segments, {} key points",
            segments.len(),
            key_points.len()
        );

        let record = TranscriptRecord::new(audio_path.to_path_buf(), transcript, key_points);
        let json_path = persist_transcript(&record).await?;

        Ok(TranscriptArtifact { record, json_path })
    }
}
