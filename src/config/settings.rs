//! Configuration settings for Stepreel.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub agents: AgentSettings,
    pub transcription: TranscriptionSettings,
    pub media: MediaSettings,
    pub slideshow: SlideshowSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Working directory; downloads land in `<work_dir>/videos`.
    pub work_dir: String,
    /// Log level for the `stepreel` target when no `-v` flag is given.
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            work_dir: ".".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Models and turn budgets for each agent role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Model for the search stage.
    pub search_model: String,
    /// Model for the download stage.
    pub download_model: String,
    /// Model for the understanding stage.
    pub understanding_model: String,
    /// Model for the editing stage.
    pub editing_model: String,
    /// Turn budget for the search and download stages.
    pub manager_max_turns: usize,
    /// Turn budget for the understanding and editing stages.
    pub stage_max_turns: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            search_model: "gpt-4o".to_string(),
            download_model: "o3-mini".to_string(),
            understanding_model: "gpt-4o".to_string(),
            editing_model: "o3-mini".to_string(),
            manager_max_turns: 20,
            stage_max_turns: 10,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Audio beyond this many seconds is trimmed before upload.
    pub max_duration_seconds: u32,
    /// Sample rate of the converted upload.
    pub sample_rate: u32,
    /// Channel count of the converted upload.
    pub channels: u32,
    /// Bitrate of the converted upload (ffmpeg syntax).
    pub bitrate: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            max_duration_seconds: 600,
            sample_rate: 16000,
            channels: 1,
            bitrate: "64k".to_string(),
        }
    }
}

/// External media tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Maximum video height requested from the downloader.
    pub max_height: u32,
    /// Deadline for any single subprocess invocation.
    pub timeout_seconds: u64,
    /// Extra attempts after a failed or timed-out invocation.
    pub retries: u32,
    /// Number of candidates requested from a video search.
    pub search_results: u32,
    /// Directory holding yt-dlp, ffmpeg and ffprobe. `PATH` is used when unset.
    pub tool_dir: Option<String>,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            max_height: 720,
            timeout_seconds: 600,
            retries: 1,
            search_results: 5,
            tool_dir: None,
        }
    }
}

impl MediaSettings {
    /// Subprocess deadline as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Expanded tool directory, if configured.
    pub fn tool_dir(&self) -> Option<PathBuf> {
        self.tool_dir.as_deref().map(Settings::expand_path)
    }
}

/// Defaults for slideshow assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideshowSettings {
    /// Output frame rate.
    pub fps: u32,
    /// How long each frame stays on screen.
    pub seconds_per_frame: u32,
    /// Fade the clip in and out.
    pub transitions: bool,
    /// Overlay font size in pixels.
    pub font_size: u32,
}

impl Default for SlideshowSettings {
    fn default() -> Self {
        Self {
            fps: 25,
            seconds_per_frame: 3,
            transitions: true,
            font_size: 24,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom agent instructions (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stepreel")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded working directory path.
    pub fn work_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.work_dir)
    }

    /// Directory shared by downloaded videos and their audio tracks.
    pub fn videos_dir(&self) -> PathBuf {
        self.work_dir().join("videos")
    }
}
