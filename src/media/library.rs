//! The shared videos directory and the external tools the pipeline needs.

use super::process::ToolRunner;
use crate::error::{Result, StepreelError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];

/// External tools and the flag that prints their version.
pub const REQUIRED_TOOLS: &[(&str, &str)] =
    &[("yt-dlp", "--version"), ("ffmpeg", "-version"), ("ffprobe", "-version")];

/// A video found in the working directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibraryVideo {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// `<stem>.mp3` next to the video, when present.
    pub audio_path: Option<PathBuf>,
}

/// Availability of one external tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolVersion {
    pub name: String,
    pub installed: bool,
    pub version: Option<String>,
}

fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Videos in `dir`, sorted by file name. A missing directory is empty.
pub fn list_available_videos(dir: &Path) -> Result<Vec<LibraryVideo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut videos: Vec<LibraryVideo> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_video(path))
        .map(|path| {
            let audio = path.with_extension("mp3");
            LibraryVideo {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                size_bytes: std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0),
                audio_path: audio.exists().then_some(audio),
                path,
            }
        })
        .collect();

    videos.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(videos)
}

/// Find a video by file name in `dir`, or accept `name` as a direct path.
pub fn resolve_video(dir: &Path, name: &str) -> Result<PathBuf> {
    let in_library = dir.join(name);
    if in_library.is_file() {
        return Ok(in_library);
    }
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Ok(direct);
    }
    Err(StepreelError::MissingArtifact(in_library))
}

/// Probe each required tool for its version line.
pub async fn tool_versions(runner: &ToolRunner) -> Vec<ToolVersion> {
    let mut versions = Vec::with_capacity(REQUIRED_TOOLS.len());

    for (name, flag) in REQUIRED_TOOLS {
        let version = match runner.run(name, [*flag]).await {
            Ok(output) => output
                .stdout
                .lines()
                .next()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .or_else(|| Some("installed".to_string())),
            Err(e) => {
                debug!("{} unavailable: {}", name, e);
                None
            }
        };

        versions.push(ToolVersion {
            name: name.to_string(),
            installed: version.is_some(),
            version,
        });
    }

    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_available_videos() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("squash.mp4"), b"video").unwrap();
        std::fs::write(dir.path().join("squash.mp3"), b"audio").unwrap();
        std::fs::write(dir.path().join("guitar.MKV"), b"video").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        std::fs::create_dir(dir.path().join("transcripts")).unwrap();

        let videos = list_available_videos(dir.path()).unwrap();
        let names: Vec<_> = videos.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["guitar.MKV", "squash.mp4"]);

        assert!(videos[0].audio_path.is_none());
        assert_eq!(videos[1].audio_path, Some(dir.path().join("squash.mp3")));
        assert_eq!(videos[1].size_bytes, 5);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let videos = list_available_videos(Path::new("/nonexistent/videos")).unwrap();
        assert!(videos.is_empty());
    }

    #[test]
    fn test_resolve_video() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("steak.mp4");
        std::fs::write(&video, b"video").unwrap();

        assert_eq!(resolve_video(dir.path(), "steak.mp4").unwrap(), video);
        assert_eq!(
            resolve_video(Path::new("/elsewhere"), video.to_str().unwrap()).unwrap(),
            video
        );
        assert!(matches!(
            resolve_video(dir.path(), "missing.mp4"),
            Err(StepreelError::MissingArtifact(_))
        ));
    }

    #[tokio::test]
    async fn test_tool_versions_reports_every_tool() {
        let versions = tool_versions(&ToolRunner::default()).await;
        let names: Vec<_> = versions.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["yt-dlp", "ffmpeg", "ffprobe"]);
        for v in versions {
            assert_eq!(v.installed, v.version.is_some());
        }
    }
}
