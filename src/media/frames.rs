//! Still-frame extraction with ffmpeg.

use super::process::ToolRunner;
use super::timestamp::timestamp_to_seconds;
use crate::error::{Result, StepreelError};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// A frame written to disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedFrame {
    /// Timestamp as requested.
    pub timestamp: String,
    pub seconds: u32,
    pub path: PathBuf,
}

/// Outcome of `extract_frames`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameExtraction {
    pub frames_dir: PathBuf,
    pub frames: Vec<ExtractedFrame>,
}

/// `<video dir>/<video stem>_frames`.
pub fn default_frames_dir(video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    video_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{}_frames", stem))
}

/// `frame_NN_<seconds>s.jpg`, numbered from 1 in request order.
pub fn frame_file_name(index: usize, seconds: u32) -> String {
    format!("frame_{:02}_{}s.jpg", index + 1, seconds)
}

/// Remove `frame_*.jpg` files left in `dir` by an earlier extraction.
fn clear_previous_frames(dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_frame = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("frame_") && n.ends_with(".jpg"));
        if is_frame && path.is_file() {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Grab one frame per timestamp.
///
/// Frames from earlier extractions into the same directory are removed
/// first. Timestamps that cannot be parsed, or for which ffmpeg produces no
/// file, are left out of the result instead of failing the whole call.
#[instrument(skip(runner, timestamps, out_dir), fields(video = %video_path.display(), count = timestamps.len()))]
pub async fn extract_frames(
    runner: &ToolRunner,
    video_path: &Path,
    timestamps: &[String],
    out_dir: Option<&Path>,
) -> Result<FrameExtraction> {
    if !video_path.exists() {
        return Err(StepreelError::MissingArtifact(video_path.to_path_buf()));
    }

    let frames_dir = out_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_frames_dir(video_path));
    std::fs::create_dir_all(&frames_dir)?;
    clear_previous_frames(&frames_dir)?;

    let mut frames = Vec::with_capacity(timestamps.len());

    for (i, timestamp) in timestamps.iter().enumerate() {
        let seconds = match timestamp_to_seconds(timestamp) {
            Ok(s) => s,
            Err(e) => {
                warn!("Skipping frame {}: {}", i + 1, e);
                continue;
            }
        };

        let output_file = frames_dir.join(frame_file_name(i, seconds));
        let seek = seconds.to_string();
        let args = [
            OsStr::new("-ss"),
            OsStr::new(&seek),
            OsStr::new("-i"),
            video_path.as_os_str(),
            OsStr::new("-vframes"),
            OsStr::new("1"),
            OsStr::new("-q:v"),
            OsStr::new("2"),
            OsStr::new("-y"),
            OsStr::new("-loglevel"),
            OsStr::new("error"),
            output_file.as_os_str(),
        ];
        let result = runner.run("ffmpeg", args).await;

        match result {
            Ok(_) if output_file.exists() => {
                debug!("Extracted frame at {}s", seconds);
                frames.push(ExtractedFrame {
                    timestamp: timestamp.clone(),
                    seconds,
                    path: output_file,
                });
            }
            Ok(_) => warn!("No frame produced at {}s", seconds),
            Err(e @ StepreelError::ToolNotFound(_)) => return Err(e),
            Err(e) => warn!("Frame at {}s failed: {}", seconds, e),
        }
    }

    info!("Extracted {}/{} frames", frames.len(), timestamps.len());
    Ok(FrameExtraction { frames_dir, frames })
}
