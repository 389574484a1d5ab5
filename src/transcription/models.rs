//! Data models for transcription.

use crate::media::timestamp::format_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single segment of transcribed speech.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }

    /// `[MM:SS] - [MM:SS] - text`
    pub fn to_line(&self) -> String {
        format!(
            "[{}] - [{}] - {}",
            format_timestamp(self.start_seconds),
            format_timestamp(self.end_seconds),
            self.text.trim()
        )
    }
}

/// Flatten segments into one line per segment, in order.
pub fn format_transcript(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(TranscriptSegment::to_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A transcript as written to its JSON sidecar.
///
/// Field names are read back by the understanding stage and must not change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptRecord {
    pub audio_path: PathBuf,
    pub transcript: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
}

impl TranscriptRecord {
    pub fn new(audio_path: PathBuf, transcript: String, key_points: Vec<String>) -> Self {
        Self {
            audio_path,
            transcript,
            created_at: Utc::now(),
            key_points,
        }
    }
}

/// A persisted transcript and the sidecar it lives in.
#[derive(Debug, Clone)]
pub struct TranscriptArtifact {
    pub record: TranscriptRecord,
    pub json_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_line() {
        let seg = TranscriptSegment::new(5.4, 71.9, "  First, hold the racket loosely. ");
        assert_eq!(seg.to_line(), "[00:05] - [01:11] - First, hold the racket loosely.");
    }

    #[test]
    fn test_format_transcript_keeps_order() {
        let segments = vec![
            TranscriptSegment::new(0.0, 4.0, "Welcome."),
            TranscriptSegment::new(4.0, 9.5, "Step one is the grip."),
        ];
        assert_eq!(
            format_transcript(&segments),
            "[00:00] - [00:04] - Welcome.\n[00:04] - [00:09] - Step one is the grip."
        );
        assert_eq!(format_transcript(&[]), "");
    }

    #[test]
    fn test_record_json_field_names() {
        let record = TranscriptRecord::new(
            PathBuf::from("/w/videos/squash.mp3"),
            "[00:00] - [00:04] - Welcome.".to_string(),
            Vec::new(),
        );
        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["audio_path"], "/w/videos/squash.mp3");
        assert!(obj["timestamp"].as_str().unwrap().contains('T'));
        assert!(!obj.contains_key("key_points"));
        assert!(!obj.contains_key("created_at"));

        let with_points = TranscriptRecord {
            key_points: vec!["tip".into()],
            ..record
        };
        let json = serde_json::to_value(&with_points).unwrap();
        assert_eq!(json["key_points"][0], "tip");
    }
}
