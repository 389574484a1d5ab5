//! JSON sidecar persistence for transcripts.

use super::models::TranscriptRecord;
use crate::error::{Result, StepreelError};
use std::path::{Path, PathBuf};
use tracing::info;

/// `<audio dir>/transcripts/<audio stem>_transcript.json`.
pub fn transcript_json_path(audio_path: &Path) -> PathBuf {
    let stem = audio_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    audio_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("transcripts")
        .join(format!("{}_transcript.json", stem))
}

/// Write `record` next to its audio file and return the sidecar path.
pub async fn persist_transcript(record: &TranscriptRecord) -> Result<PathBuf> {
    let path = transcript_json_path(&record.audio_path);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(record)?;
    tokio::fs::write(&path, json).await?;

    info!("Transcript saved to {}", path.display());
    Ok(path)
}

/// Read a sidecar written by `persist_transcript`.
pub async fn load_transcript(path: &Path) -> Result<TranscriptRecord> {
    if !path.exists() {
        return Err(StepreelError::MissingArtifact(path.to_path_buf()));
    }
    let json = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}
