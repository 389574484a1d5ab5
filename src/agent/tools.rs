//! Tool definitions and implementations for the stage agents.

use super::schema::AgentRole;
use crate::config::Settings;
use crate::error::{Result, StepreelError};
use crate::media::{self, SlideshowOptions, TextOverlay, ToolRunner};
use crate::transcription::load_transcript;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;

/// Available tools for the agents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search YouTube for candidate videos.
    SearchYoutubeVideos {
        query: String,
        #[serde(default)]
        max_results: Option<u32>,
    },

    /// Check a URL and read its metadata.
    VerifyVideoUrl { url: String },

    /// Download a video into the videos directory.
    DownloadVideo {
        url: String,
        #[serde(default)]
        file_stem: Option<String>,
    },

    /// Extract the audio track of a local video.
    ExtractAudio { video_path: PathBuf },

    /// Report which media tools are installed.
    ListInstalledTools,

    /// Read a transcript sidecar.
    ReadTranscriptJson { json_path: PathBuf },

    /// Capture still frames at the given timestamps.
    ExtractVideoFrames {
        video_path: PathBuf,
        timestamps: Vec<String>,
        #[serde(default)]
        output_dir: Option<PathBuf>,
    },

    /// Build a slideshow from a directory of frames.
    CreateVideoFromFrames {
        frames_dir: PathBuf,
        #[serde(default)]
        output_path: Option<PathBuf>,
        #[serde(default)]
        fps: Option<u32>,
        #[serde(default)]
        duration_per_frame: Option<u32>,
        #[serde(default)]
        text_overlays: Vec<OverlayArg>,
        #[serde(default)]
        add_transitions: Option<bool>,
    },

    /// List videos already in the videos directory.
    ListAvailableVideos,
}

/// A caption given either as a bare string or as `{"text": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OverlayArg {
    Text(String),
    Object(TextOverlay),
}

impl From<OverlayArg> for TextOverlay {
    fn from(arg: OverlayArg) -> Self {
        match arg {
            OverlayArg::Text(text) => TextOverlay { text },
            OverlayArg::Object(overlay) => overlay,
        }
    }
}

impl ToolCall {
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::SearchYoutubeVideos { .. } => "search_youtube_videos",
            ToolCall::VerifyVideoUrl { .. } => "verify_video_url",
            ToolCall::DownloadVideo { .. } => "download_video",
            ToolCall::ExtractAudio { .. } => "extract_audio",
            ToolCall::ListInstalledTools => "list_installed_tools",
            ToolCall::ReadTranscriptJson { .. } => "read_transcript_json",
            ToolCall::ExtractVideoFrames { .. } => "extract_video_frames",
            ToolCall::CreateVideoFromFrames { .. } => "create_video_from_frames",
            ToolCall::ListAvailableVideos => "list_available_videos",
        }
    }
}

/// Tool names each role may call.
pub fn role_tools(role: AgentRole) -> &'static [&'static str] {
    match role {
        AgentRole::Search => &["search_youtube_videos", "verify_video_url"],
        AgentRole::Download => &[
            "download_video",
            "extract_audio",
            "list_installed_tools",
            "list_available_videos",
        ],
        AgentRole::Understanding => &["read_transcript_json", "extract_video_frames"],
        AgentRole::Editing => &["create_video_from_frames"],
    }
}

/// Tool execution context: the subprocess runner and where media lives.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub runner: ToolRunner,
    pub videos_dir: PathBuf,
    pub max_height: u32,
    pub search_results: u32,
    pub slideshow: SlideshowOptions,
}

impl ToolContext {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            runner: ToolRunner::from_settings(&settings.media),
            videos_dir: settings.videos_dir(),
            max_height: settings.media.max_height,
            search_results: settings.media.search_results,
            slideshow: SlideshowOptions::from(&settings.slideshow),
        }
    }

    /// Execute a tool call and return its JSON result.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::SearchYoutubeVideos { query, max_results } => {
                let limit = max_results.unwrap_or(self.search_results).clamp(1, 20);
                let videos = media::search_videos(&self.runner, query, limit).await?;
                if videos.is_empty() {
                    return Ok(json!({"status": "success", "videos": [], "message": "No videos found"})
                        .to_string());
                }
                success(json!({ "videos": videos }))
            }
            ToolCall::VerifyVideoUrl { url } => {
                let info = media::verify_video_url(&self.runner, url).await?;
                success(info)
            }
            ToolCall::DownloadVideo { url, file_stem } => {
                let downloaded = media::download_video(
                    &self.runner,
                    url,
                    &self.videos_dir,
                    self.max_height,
                    file_stem.as_deref(),
                )
                .await?;
                success(downloaded)
            }
            ToolCall::ExtractAudio { video_path } => {
                let track = media::extract_audio_track(&self.runner, video_path, None).await?;
                success(track)
            }
            ToolCall::ListInstalledTools => {
                let tools = media::tool_versions(&self.runner).await;
                success(json!({ "tools": tools }))
            }
            ToolCall::ReadTranscriptJson { json_path } => {
                let record = load_transcript(json_path).await?;
                success(record)
            }
            ToolCall::ExtractVideoFrames {
                video_path,
                timestamps,
                output_dir,
            } => {
                if timestamps.is_empty() {
                    return Err(StepreelError::InvalidInput(
                        "timestamps must not be empty".to_string(),
                    ));
                }
                let extraction = media::extract_frames(
                    &self.runner,
                    video_path,
                    timestamps,
                    output_dir.as_deref(),
                )
                .await?;
                success(json!({
                    "frames_dir": extraction.frames_dir,
                    "frame_count": extraction.frames.len(),
                    "frames": extraction.frames,
                }))
            }
            ToolCall::CreateVideoFromFrames {
                frames_dir,
                output_path,
                fps,
                duration_per_frame,
                text_overlays,
                add_transitions,
            } => {
                let options = SlideshowOptions {
                    fps: fps.unwrap_or(self.slideshow.fps),
                    seconds_per_frame: duration_per_frame.unwrap_or(self.slideshow.seconds_per_frame),
                    transitions: add_transitions.unwrap_or(self.slideshow.transitions),
                    font_size: self.slideshow.font_size,
                };
                let overlays: Vec<TextOverlay> =
                    text_overlays.iter().cloned().map(TextOverlay::from).collect();
                let slideshow = media::assemble_slideshow(
                    &self.runner,
                    frames_dir,
                    output_path.as_deref(),
                    (!overlays.is_empty()).then_some(overlays.as_slice()),
                    &options,
                )
                .await?;
                success(slideshow)
            }
            ToolCall::ListAvailableVideos => {
                let videos = media::list_available_videos(&self.videos_dir)?;
                success(json!({
                    "videos_dir": self.videos_dir,
                    "count": videos.len(),
                    "videos": videos,
                }))
            }
        }
    }
}

/// Serialize `value` as a JSON object tagged `"status": "success"`.
fn success<T: Serialize>(value: T) -> Result<String> {
    let mut json = serde_json::to_value(value)?;
    match json.as_object_mut() {
        Some(obj) => {
            obj.insert("status".to_string(), json!("success"));
        }
        None => json = json!({ "status": "success", "result": json }),
    }
    Ok(json.to_string())
}

/// Render a tool failure for the model.
pub fn error_result(error: &StepreelError) -> String {
    let mut json = json!({ "status": "error", "message": error.to_string() });
    if let Some(stderr) = error.stderr() {
        json["stderr"] = json!(stderr);
    }
    json.to_string()
}

fn function(name: &str, description: &str, parameters: serde_json::Value) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: name.to_string(),
            description: Some(description.to_string()),
            parameters: Some(parameters),
            strict: None,
        },
    }
}

fn all_tool_definitions() -> Vec<ChatCompletionTool> {
    vec![
        function(
            "search_youtube_videos",
            "Search YouTube and return candidate videos with title, url, duration, uploader and view count.",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "Search terms"},
                    "max_results": {"type": "integer", "description": "Maximum number of results (default: 5)"}
                },
                "required": ["query"]
            }),
        ),
        function(
            "verify_video_url",
            "Check that a video URL is available and return its metadata.",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "The video URL"}
                },
                "required": ["url"]
            }),
        ),
        function(
            "download_video",
            "Download a video into the videos directory. Returns the absolute video_path.",
            json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "The video URL"},
                    "file_stem": {"type": "string", "description": "Short file name without extension, e.g. steak_cooking"}
                },
                "required": ["url"]
            }),
        ),
        function(
            "extract_audio",
            "Extract the audio track of a local video to an MP3 beside it. Returns output_path, duration, sample_rate and channels.",
            json!({
                "type": "object",
                "properties": {
                    "video_path": {"type": "string", "description": "Path to the video file"}
                },
                "required": ["video_path"]
            }),
        ),
        function(
            "list_installed_tools",
            "Report whether yt-dlp, ffmpeg and ffprobe are installed, with their versions.",
            json!({"type": "object", "properties": {}}),
        ),
        function(
            "read_transcript_json",
            "Read a saved transcript JSON file with timestamped lines and key points.",
            json!({
                "type": "object",
                "properties": {
                    "json_path": {"type": "string", "description": "Path to the transcript JSON file"}
                },
                "required": ["json_path"]
            }),
        ),
        function(
            "extract_video_frames",
            "Capture one still frame per timestamp. Timestamps that fail are left out of the result.",
            json!({
                "type": "object",
                "properties": {
                    "video_path": {"type": "string", "description": "Path to the video file"},
                    "timestamps": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Timestamps as MM:SS or seconds"
                    },
                    "output_dir": {"type": ["string", "null"], "description": "Directory for frames (default: <video>_frames beside the video)"}
                },
                "required": ["video_path", "timestamps"]
            }),
        ),
        function(
            "create_video_from_frames",
            "Build a slideshow video from the frames in a directory, with optional captions per frame.",
            json!({
                "type": "object",
                "properties": {
                    "frames_dir": {"type": "string", "description": "Directory containing the frames"},
                    "output_path": {"type": ["string", "null"], "description": "Output video path (default: output/summary_video.mp4 beside the frames directory)"},
                    "fps": {"type": ["integer", "null"], "description": "Frames per second of the output"},
                    "duration_per_frame": {"type": ["integer", "null"], "description": "Seconds each frame is shown"},
                    "text_overlays": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "One caption per frame, in frame order"
                    },
                    "add_transitions": {"type": ["boolean", "null"], "description": "Fade in and out"}
                },
                "required": ["frames_dir"]
            }),
        ),
        function(
            "list_available_videos",
            "List videos already present in the videos directory.",
            json!({"type": "object", "properties": {}}),
        ),
    ]
}

/// Get OpenAI function/tool definitions for one role.
pub fn tool_definitions(role: AgentRole) -> Vec<ChatCompletionTool> {
    let allowed = role_tools(role);
    all_tool_definitions()
        .into_iter()
        .filter(|tool| allowed.contains(&tool.function.name.as_str()))
        .collect()
}

/// Parse a tool call from the OpenAI response format.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let mut args: serde_json::Value = if arguments.trim().is_empty() {
        json!({})
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| StepreelError::Agent(format!("Invalid tool arguments: {}", e)))?
    };

    let obj = args
        .as_object_mut()
        .ok_or_else(|| StepreelError::Agent("Tool arguments must be a JSON object".to_string()))?;
    obj.insert("name".to_string(), json!(name));

    serde_json::from_value(args)
        .map_err(|e| StepreelError::Agent(format!("Invalid call to {}: {}", name, e)))
}
