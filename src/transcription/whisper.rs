//! OpenAI Whisper transcription with segment-level timestamps.

use super::models::TranscriptSegment;
use crate::error::{Result, StepreelError};
use crate::openai::create_client;
use async_openai::types::{
    AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs, TimestampGranularity,
};
use std::path::Path;
use tracing::{debug, instrument};

/// Calls the hosted speech-to-text endpoint.
pub struct WhisperClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperClient {
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }

    /// Transcribe one audio file into timed segments.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    pub async fn transcribe_segments(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>> {
        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .timestamp_granularities(vec![TimestampGranularity::Segment])
            .build()
            .map_err(|e| StepreelError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| StepreelError::Transcription(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = match response.segments {
            Some(segs) if !segs.is_empty() => segs
                .iter()
                .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim()))
                .collect(),
            // No segment data: keep the text as one span
            _ if !response.text.trim().is_empty() => vec![TranscriptSegment::new(
                0.0,
                response.duration as f64,
                response.text.trim(),
            )],
            _ => Vec::new(),
        };

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }
}
