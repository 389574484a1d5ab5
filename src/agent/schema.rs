//! Structured outputs returned by agent invocations.

use crate::error::{Result, StepreelError};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

/// The agent roles the pipeline delegates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Search,
    Download,
    Understanding,
    Editing,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Search => "search",
            AgentRole::Download => "download",
            AgentRole::Understanding => "understanding",
            AgentRole::Editing => "editing",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which shape an invocation must return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSchema {
    Search,
    Download,
    Understanding,
    Editing,
    Text,
}

impl OutputSchema {
    /// The schema each role is expected to produce.
    pub fn for_role(role: AgentRole) -> Self {
        match role {
            AgentRole::Search => OutputSchema::Search,
            AgentRole::Download => OutputSchema::Download,
            AgentRole::Understanding => OutputSchema::Understanding,
            AgentRole::Editing => OutputSchema::Editing,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputSchema::Search => "search",
            OutputSchema::Download => "download",
            OutputSchema::Understanding => "understanding",
            OutputSchema::Editing => "editing",
            OutputSchema::Text => "text",
        }
    }

    /// Whether the reply must be a JSON object.
    pub fn is_structured(&self) -> bool {
        !matches!(self, OutputSchema::Text)
    }

    /// Parse a final agent reply into the declared shape.
    ///
    /// A search reply that is not JSON is scanned for a URL instead.
    pub fn parse(&self, reply: &str) -> Result<StageOutput> {
        Ok(match self {
            OutputSchema::Search => StageOutput::Search(
                self.parse_json(reply)
                    .or_else(|_| SearchResult::from_free_text(reply))?,
            ),
            OutputSchema::Download => StageOutput::Download(self.parse_json(reply)?),
            OutputSchema::Understanding => StageOutput::Understanding(self.parse_json(reply)?),
            OutputSchema::Editing => StageOutput::Editing(self.parse_json(reply)?),
            OutputSchema::Text => StageOutput::Text(reply.trim().to_string()),
        })
    }

    fn parse_json<T: DeserializeOwned>(&self, reply: &str) -> Result<T> {
        let mismatch = |reason: String| StepreelError::SchemaMismatch {
            schema: self.name().to_string(),
            reason,
        };

        let body = json_body(reply).ok_or_else(|| mismatch("reply contains no JSON object".into()))?;
        serde_json::from_str(body).map_err(|e| mismatch(e.to_string()))
    }
}

/// The outermost `{...}` of a reply, tolerating code fences and prose around it.
fn json_body(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

/// Exactly one shape per stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Search(SearchResult),
    Download(DownloadResult),
    Understanding(UnderstandingResult),
    Editing(EditingResult),
    Text(String),
}

impl StageOutput {
    pub fn schema(&self) -> OutputSchema {
        match self {
            StageOutput::Search(_) => OutputSchema::Search,
            StageOutput::Download(_) => OutputSchema::Download,
            StageOutput::Understanding(_) => OutputSchema::Understanding,
            StageOutput::Editing(_) => OutputSchema::Editing,
            StageOutput::Text(_) => OutputSchema::Text,
        }
    }
}

/// The video chosen by the search stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub view_count: Option<u64>,
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).expect("Invalid regex"))
}

impl SearchResult {
    /// Best-effort recovery of a URL from a prose reply.
    pub fn from_free_text(reply: &str) -> Result<Self> {
        let url = url_regex()
            .find_iter(reply)
            .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']))
            .find(|candidate| {
                url::Url::parse(candidate)
                    .map(|u| u.host_str().is_some())
                    .unwrap_or(false)
            })
            .ok_or_else(|| StepreelError::SearchExtraction(truncate(reply, 200)))?;

        Ok(Self {
            url: url.to_string(),
            title: None,
            uploader: None,
            duration: None,
            view_count: None,
        })
    }

    /// Check that the URL is an absolute http(s) URL.
    pub fn validate(self) -> Result<Self> {
        match url::Url::parse(&self.url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") && u.host_str().is_some() => Ok(self),
            _ => Err(StepreelError::SearchExtraction(format!("not a video URL: {}", self.url))),
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title.as_deref().unwrap_or("Untitled video"))?;
        if let Some(uploader) = &self.uploader {
            write!(f, " by {}", uploader)?;
        }
        if let Some(duration) = self.duration {
            write!(f, " ({}s)", duration)?;
        }
        write!(f, " - {}", self.url)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        format!("{}...", trimmed.chars().take(max_chars).collect::<String>())
    }
}

/// Models sometimes send numbers as strings or floats.
fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        serde_json::Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok().map(|f| f as u64),
        _ => None,
    }))
}

/// Artifacts produced by the download stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    #[serde(default)]
    pub video_path: Option<PathBuf>,
    #[serde(default)]
    pub audio_path: Option<PathBuf>,
    #[serde(default)]
    pub video_exists: bool,
    #[serde(default)]
    pub audio_exists: bool,
}

impl DownloadResult {
    /// Build from paths on disk, checking existence now.
    pub fn from_paths(video_path: PathBuf, audio_path: Option<PathBuf>) -> Self {
        Self {
            video_exists: video_path.exists(),
            audio_exists: audio_path.as_ref().is_some_and(|p| p.exists()),
            video_path: Some(video_path),
            audio_path,
        }
    }

    /// The video path, if it exists on disk right now.
    pub fn existing_video(&self) -> Option<&PathBuf> {
        self.video_path.as_ref().filter(|p| p.exists())
    }

    /// The audio path, if it exists on disk right now.
    pub fn existing_audio(&self) -> Option<&PathBuf> {
        self.audio_path.as_ref().filter(|p| p.exists())
    }
}

impl fmt::Display for DownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        };
        writeln!(
            f,
            "Video: {}{}",
            show(&self.video_path),
            if self.video_exists { "" } else { " (missing)" }
        )?;
        write!(
            f,
            "Audio: {}{}",
            show(&self.audio_path),
            if self.audio_exists { "" } else { " (missing)" }
        )
    }
}

/// One step identified by the understanding stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyStep {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub frame: Option<String>,
}

impl KeyStep {
    /// Description with its timestamp, e.g. `Grip the racket (at 00:42)`.
    pub fn label(&self) -> String {
        let description = if self.description.trim().is_empty() {
            "Step"
        } else {
            self.description.trim()
        };
        match &self.timestamp {
            Some(ts) => format!("{} (at {})", description, ts),
            None => description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderstandingResult {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub key_steps: Vec<KeyStep>,
    pub frames_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditingResult {
    pub output_video_path: PathBuf,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub frame_count: u64,
}
