//! Transcription adapter.
//!
//! Audio is downsampled and trimmed with ffmpeg into a scratch directory,
//! sent to OpenAI Whisper with segment-level timestamps, flattened into
//! `[MM:SS] - [MM:SS] - text` lines, scanned for key points and persisted to
//! a JSON sidecar under `transcripts/` beside the audio file.

mod key_points;
mod models;
mod processor;
mod store;
mod whisper;

pub use key_points::{extract_key_points, KEY_WORDS};
pub use models::{format_transcript, TranscriptArtifact, TranscriptRecord, TranscriptSegment};
pub use processor::AudioTranscriber;
pub use store::{load_transcript, persist_transcript, transcript_json_path};
pub use whisper::WhisperClient;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Turns an audio file into a persisted transcript.
#[async_trait]
pub trait TranscriptionService: Send + Sync {
    async fn process_audio(&self, audio_path: &Path) -> Result<TranscriptArtifact>;
}
