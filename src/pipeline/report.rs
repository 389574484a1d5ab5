//! Final report rendering.

use super::events::Stage;
use crate::agent::{DownloadResult, EditingResult, KeyStep, UnderstandingResult};
use crate::transcription::TranscriptRecord;
use std::fmt;
use std::path::PathBuf;

/// The outcome of one pipeline run. Rendering never fails.
#[derive(Debug, Clone)]
pub enum Report {
    /// Every stage succeeded.
    Full {
        understanding: UnderstandingResult,
        editing: EditingResult,
    },
    /// Editing failed or was skipped.
    Understanding(UnderstandingResult),
    /// Understanding failed or produced no frames.
    Transcript {
        download: DownloadResult,
        transcript: TranscriptRecord,
    },
    TranscriptionFailed {
        download: DownloadResult,
        reason: String,
    },
    /// A video exists but there is no audio track to work from.
    DownloadOnly { download: DownloadResult },
    /// A fatal stage failure.
    Failed { stage: Stage, reason: String },
    /// `--video` named a file that is not in the videos directory.
    VideoNotFound {
        name: String,
        videos_dir: PathBuf,
        available: Vec<String>,
    },
}

impl Report {
    /// True when the highlight video was produced.
    pub fn is_complete(&self) -> bool {
        matches!(self, Report::Full { .. })
    }
}

/// `\n1. Description (at MM:SS) - Frame: path` per step.
pub fn format_key_steps(steps: &[KeyStep]) -> String {
    if steps.is_empty() {
        return "\n(No key steps identified)".to_string();
    }

    steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let mut line = format!("\n{}. {}", i + 1, step.label());
            if let Some(frame) = &step.frame {
                line.push_str(&format!(" - Frame: {}", frame));
            }
            line
        })
        .collect()
}

fn write_analysis(f: &mut fmt::Formatter<'_>, understanding: &UnderstandingResult) -> fmt::Result {
    write!(
        f,
        "Video Analysis Summary:\n\n{}\n\nKey Steps:{}\n\nFrames extracted to: {}",
        understanding.summary,
        format_key_steps(&understanding.key_steps),
        understanding.frames_dir.display()
    )
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Full {
                understanding,
                editing,
            } => {
                write!(
                    f,
                    "Video Creation Summary:\n\n\
                     Created a short video highlighting the key steps.\n\
                     Output video: {}\n\
                     Duration: {} seconds\n\
                     Frame count: {}\n\n",
                    editing.output_video_path.display(),
                    editing.duration,
                    editing.frame_count
                )?;
                write_analysis(f, understanding)
            }
            Report::Understanding(understanding) => write_analysis(f, understanding),
            Report::Transcript {
                download,
                transcript,
            } => {
                let key_points = if transcript.key_points.is_empty() {
                    "(No key points identified)".to_string()
                } else {
                    transcript
                        .key_points
                        .iter()
                        .map(|p| format!("- {}", p))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                write!(
                    f,
                    "{}\n\n--- TRANSCRIPT ---\n{}\n\n--- KEY POINTS ---\n{}",
                    download, transcript.transcript, key_points
                )
            }
            Report::TranscriptionFailed { download, reason } => {
                write!(f, "{}\n\nAudio transcription failed: {}", download, reason)
            }
            Report::DownloadOnly { download } => write!(
                f,
                "{}\n\nNo audio track was available, so transcription and the later stages were skipped.",
                download
            ),
            Report::Failed { stage, reason } => write!(f, "{} failed: {}", stage, reason),
            Report::VideoNotFound {
                name,
                videos_dir,
                available,
            } => {
                write!(f, "Video not found: {}\n\n", name)?;
                if available.is_empty() {
                    write!(f, "No videos available in {}", videos_dir.display())
                } else {
                    write!(f, "Available videos in {}:", videos_dir.display())?;
                    for video in available {
                        write!(f, "\n- {}", video)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn understanding() -> UnderstandingResult {
        UnderstandingResult {
            summary: "How to hit a squash drive.".into(),
            key_steps: vec![
                KeyStep {
                    description: "Grip the racket".into(),
                    timestamp: Some("00:42".into()),
                    frame: Some("/w/videos/squash_frames/frame_01_42s.jpg".into()),
                },
                KeyStep {
                    description: String::new(),
                    timestamp: None,
                    frame: None,
                },
            ],
            frames_dir: PathBuf::from("/w/videos/squash_frames"),
        }
    }

    #[test]
    fn test_format_key_steps() {
        assert_eq!(
            format_key_steps(&understanding().key_steps),
            "\n1. Grip the racket (at 00:42) - Frame: /w/videos/squash_frames/frame_01_42s.jpg\n2. Step"
        );
        assert_eq!(format_key_steps(&[]), "\n(No key steps identified)");
    }

    #[test]
    fn test_full_report() {
        let report = Report::Full {
            understanding: understanding(),
            editing: EditingResult {
                output_video_path: PathBuf::from("/w/videos/output/summary_video.mp4"),
                duration: 6.0,
                frame_count: 2,
            },
        };
        let text = report.to_string();
        assert!(text.starts_with(
            "Video Creation Summary:\n\nCreated a short video highlighting the key steps.\n\
             Output video: /w/videos/output/summary_video.mp4\nDuration: 6 seconds\nFrame count: 2\n\n\
             Video Analysis Summary:\n\nHow to hit a squash drive.\n\nKey Steps:\n1. Grip the racket (at 00:42)"
        ));
        assert!(text.ends_with("Frames extracted to: /w/videos/squash_frames"));
        assert!(report.is_complete());
    }

    #[test]
    fn test_transcript_report() {
        let download = DownloadResult {
            video_path: Some(PathBuf::from("/w/videos/a.mp4")),
            audio_path: Some(PathBuf::from("/w/videos/a.mp3")),
            video_exists: true,
            audio_exists: true,
        };
        let transcript = TranscriptRecord::new(
            PathBuf::from("/w/videos/a.mp3"),
            "[00:00] - [00:03] - First, warm up.".into(),
            vec!["[00:00] - [00:03] - First, warm up.".into()],
        );
        let text = Report::Transcript {
            download,
            transcript,
        }
        .to_string();

        assert!(text.starts_with("Video: /w/videos/a.mp4\nAudio: /w/videos/a.mp3\n\n--- TRANSCRIPT ---\n"));
        assert!(text.ends_with("--- KEY POINTS ---\n- [00:00] - [00:03] - First, warm up."));
    }

    #[test]
    fn test_video_not_found_lists_available() {
        let text = Report::VideoNotFound {
            name: "nope.mp4".into(),
            videos_dir: PathBuf::from("/w/videos"),
            available: vec!["a.mp4".into(), "b.mkv".into()],
        }
        .to_string();
        assert_eq!(
            text,
            "Video not found: nope.mp4\n\nAvailable videos in /w/videos:\n- a.mp4\n- b.mkv"
        );
    }

    #[test]
    fn test_failed_report() {
        let text = Report::Failed {
            stage: Stage::Download,
            reason: "yt-dlp exited with 1".into(),
        }
        .to_string();
        assert_eq!(text, "Download failed: yt-dlp exited with 1");
    }
}
