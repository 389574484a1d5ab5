//! Audio track extraction and transcription-ready conversion.

use super::process::ToolRunner;
use crate::error::{Result, StepreelError};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info, instrument};

/// Stream properties of an extracted audio track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioTrack {
    pub output_path: PathBuf,
    pub duration: u64,
    pub sample_rate: u32,
    pub channels: u32,
}

/// Target format for speech-to-text uploads.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub max_duration_seconds: u32,
    pub sample_rate: u32,
    pub channels: u32,
    pub bitrate: String,
}

impl From<&crate::config::TranscriptionSettings> for ConversionOptions {
    fn from(settings: &crate::config::TranscriptionSettings) -> Self {
        Self {
            max_duration_seconds: settings.max_duration_seconds,
            sample_rate: settings.sample_rate,
            channels: settings.channels,
            bitrate: settings.bitrate.clone(),
        }
    }
}

/// A converted audio file living in its own temporary directory.
///
/// The directory and file are removed when this value is dropped.
#[derive(Debug)]
pub struct ScratchAudio {
    dir: TempDir,
    path: PathBuf,
}

impl ScratchAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// `<video dir>/<video stem>.mp3`.
pub fn default_audio_path(video_path: &Path) -> PathBuf {
    video_path.with_extension("mp3")
}

/// Demux the audio stream of `video_path` to `output_path` (default: same stem, `.mp3`).
#[instrument(skip(runner, output_path), fields(video = %video_path.display()))]
pub async fn extract_audio_track(
    runner: &ToolRunner,
    video_path: &Path,
    output_path: Option<&Path>,
) -> Result<AudioTrack> {
    if !video_path.exists() {
        return Err(StepreelError::MissingArtifact(video_path.to_path_buf()));
    }

    let output_path = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_audio_path(video_path));

    runner
        .run(
            "ffmpeg",
            [
                OsStr::new("-i"),
                video_path.as_os_str(),
                OsStr::new("-vn"),
                OsStr::new("-q:a"),
                OsStr::new("0"),
                OsStr::new("-map"),
                OsStr::new("a"),
                OsStr::new("-y"),
                OsStr::new("-loglevel"),
                OsStr::new("error"),
                output_path.as_os_str(),
            ],
        )
        .await?;

    if !output_path.exists() {
        return Err(StepreelError::ExtractionFailed(format!(
            "ffmpeg reported success but {} was not created",
            output_path.display()
        )));
    }

    let probe = probe_audio(runner, &output_path).await?;
    info!("Extracted audio to {}", output_path.display());

    Ok(AudioTrack {
        output_path,
        duration: probe.duration,
        sample_rate: probe.sample_rate,
        channels: probe.channels,
    })
}

struct AudioProbe {
    duration: u64,
    sample_rate: u32,
    channels: u32,
}

/// Read duration, sample rate and channel count of the first audio stream.
async fn probe_audio(runner: &ToolRunner, path: &Path) -> Result<AudioProbe> {
    let output = runner
        .run(
            "ffprobe",
            [
                OsStr::new("-v"),
                OsStr::new("error"),
                OsStr::new("-select_streams"),
                OsStr::new("a:0"),
                OsStr::new("-show_entries"),
                OsStr::new("stream=duration,sample_rate,channels"),
                OsStr::new("-of"),
                OsStr::new("json"),
                path.as_os_str(),
            ],
        )
        .await?;

    Ok(parse_audio_probe(&output.stdout))
}

fn parse_audio_probe(json_str: &str) -> AudioProbe {
    let parsed: serde_json::Value = serde_json::from_str(json_str).unwrap_or_default();
    let stream = &parsed["streams"][0];

    // ffprobe reports numbers as strings for some fields
    let number = |v: &serde_json::Value| -> f64 {
        v.as_f64()
            .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
            .unwrap_or(0.0)
    };

    AudioProbe {
        duration: number(&stream["duration"]) as u64,
        sample_rate: number(&stream["sample_rate"]) as u32,
        channels: number(&stream["channels"]) as u32,
    }
}

/// Downsample and trim `audio_path` into a scratch file suitable for upload.
#[instrument(skip(runner, options), fields(audio = %audio_path.display()))]
pub async fn convert_for_transcription(
    runner: &ToolRunner,
    audio_path: &Path,
    options: &ConversionOptions,
) -> Result<ScratchAudio> {
    if !audio_path.exists() {
        return Err(StepreelError::MissingArtifact(audio_path.to_path_buf()));
    }

    let dir = tempfile::Builder::new().prefix("stepreel-audio-").tempdir()?;
    let path = dir.path().join("converted_audio.mp3");

    let max_duration = options.max_duration_seconds.to_string();
    let channels = options.channels.to_string();
    let sample_rate = options.sample_rate.to_string();

    runner
        .run(
            "ffmpeg",
            [
                OsStr::new("-i"),
                audio_path.as_os_str(),
                OsStr::new("-vn"),
                OsStr::new("-t"),
                OsStr::new(&max_duration),
                OsStr::new("-ac"),
                OsStr::new(&channels),
                OsStr::new("-ar"),
                OsStr::new(&sample_rate),
                OsStr::new("-b:a"),
                OsStr::new(&options.bitrate),
                OsStr::new("-y"),
                OsStr::new("-loglevel"),
                OsStr::new("error"),
                path.as_os_str(),
            ],
        )
        .await?;

    if !path.exists() {
        return Err(StepreelError::MissingArtifact(path));
    }

    debug!("Converted audio written to {}", path.display());
    Ok(ScratchAudio { dir, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_audio_path() {
        assert_eq!(
            default_audio_path(Path::new("/w/videos/squash.mp4")),
            PathBuf::from("/w/videos/squash.mp3")
        );
    }

    #[test]
    fn test_parse_audio_probe_string_fields() {
        let probe = parse_audio_probe(
            r#"{"streams": [{"sample_rate": "44100", "channels": 2, "duration": "245.512"}]}"#,
        );
        assert_eq!(probe.duration, 245);
        assert_eq!(probe.sample_rate, 44100);
        assert_eq!(probe.channels, 2);
    }

    #[test]
    fn test_parse_audio_probe_empty() {
        let probe = parse_audio_probe("not json");
        assert_eq!(probe.duration, 0);
        assert_eq!(probe.channels, 0);
    }

    #[tokio::test]
    async fn test_extract_audio_missing_video() {
        let runner = ToolRunner::default();
        let err = extract_audio_track(&runner, Path::new("/nonexistent/a.mp4"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StepreelError::MissingArtifact(_)));
    }

    #[tokio::test]
    async fn test_convert_missing_audio() {
        let runner = ToolRunner::default();
        let options = ConversionOptions::from(&crate::config::TranscriptionSettings::default());
        let err = convert_for_transcription(&runner, Path::new("/nonexistent/a.mp3"), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, StepreelError::MissingArtifact(_)));
    }

    #[cfg(unix)]
    fn shimmed_ffmpeg(body: &str) -> (tempfile::TempDir, ToolRunner) {
        let tools = tempfile::tempdir().unwrap();
        crate::media::process::write_tool_shim(tools.path(), "ffmpeg", body);
        let runner = ToolRunner::new(std::time::Duration::from_secs(5), 0).with_tool_dir(tools.path());
        (tools, runner)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extraction_without_output_file() {
        let (_tools, runner) = shimmed_ffmpeg("exit 0");
        let work = tempfile::tempdir().unwrap();
        let video = work.path().join("squash.mp4");
        std::fs::write(&video, b"video").unwrap();

        let err = extract_audio_track(&runner, &video, None).await.unwrap_err();
        assert!(matches!(err, StepreelError::ExtractionFailed(msg) if msg.contains("squash.mp3")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extraction_failure_carries_stderr() {
        let (_tools, runner) = shimmed_ffmpeg("echo 'Output file does not contain any stream' >&2; exit 1");
        let work = tempfile::tempdir().unwrap();
        let video = work.path().join("silent.mp4");
        std::fs::write(&video, b"video").unwrap();

        let err = extract_audio_track(&runner, &video, None).await.unwrap_err();
        match err {
            StepreelError::ToolFailed { tool, stderr, .. } => {
                assert_eq!(tool, "ffmpeg");
                assert_eq!(stderr, "Output file does not contain any stream");
            }
            other => panic!("Expected ToolFailed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scratch_audio_removed_on_drop() {
        let (_tools, runner) = shimmed_ffmpeg(r#"for a; do out="$a"; done; echo mp3 > "$out""#);
        let work = tempfile::tempdir().unwrap();
        let audio = work.path().join("talk.mp3");
        std::fs::write(&audio, b"audio").unwrap();
        let options = ConversionOptions::from(&crate::config::TranscriptionSettings::default());

        let scratch = convert_for_transcription(&runner, &audio, &options).await.unwrap();
        let dir = scratch.dir().to_path_buf();
        assert!(scratch.path().starts_with(&dir));
        assert!(scratch.path().is_file());

        drop(scratch);
        assert!(!dir.exists());
        assert!(audio.exists());
    }
}
