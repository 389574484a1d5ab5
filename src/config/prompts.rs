//! Agent instructions for Stepreel.
//!
//! Each role's instructions can be replaced by placing a TOML file with a
//! `system` key in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all agent instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub search: AgentPrompt,
    pub download: AgentPrompt,
    pub understanding: AgentPrompt,
    pub editing: AgentPrompt,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Instructions for a single agent role.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentPrompt {
    pub system: String,
}

impl AgentPrompt {
    fn new(system: &str) -> Self {
        Self {
            system: system.to_string(),
        }
    }
}

const SEARCH_SYSTEM: &str = r#"You find one high-quality instructional video that matches the user's request.

Tools:
- search_youtube_videos: search YouTube for candidates
- verify_video_url: confirm a candidate is available and read its metadata

Workflow:
1. Search once with a focused query.
2. Pick the single best candidate: relevant, clearly instructional, high view count, and no longer than {{max_duration}} seconds when possible.
3. Verify that one URL exactly once. If verification fails, pick the next candidate.
4. Stop using tools as soon as a URL verifies.

Reply with a JSON object and nothing else:
{"title": string, "uploader": string, "duration": integer seconds, "view_count": integer, "url": string}"#;

const DOWNLOAD_SYSTEM: &str = r#"You download a video and its audio track into the working videos directory ({{videos_dir}}).

Tools:
- download_video: download the video (use a short, simple file_stem describing the content, e.g. "steak_cooking")
- extract_audio: extract the audio track of a downloaded video to MP3 next to it
- list_installed_tools: check which media tools are available

Workflow:
1. Call download_video immediately with the URL you were given. Do not ask questions.
2. Call extract_audio on the returned video_path.
3. Report the result.

Reply with a JSON object and nothing else:
{"video_path": string, "audio_path": string, "video_exists": bool, "audio_exists": bool}
Use absolute paths exactly as the tools returned them. Set a *_exists flag to false when its tool reported an error."#;

const UNDERSTANDING_SYSTEM: &str = r#"You study an instructional video and identify the process it demonstrates.

Tools:
- read_transcript_json: read the transcript and key points saved for the video
- extract_video_frames: capture still frames at MM:SS timestamps (pass output_dir as null for the default location)

Workflow:
1. Read the transcript JSON you were given.
2. Use the key points and timestamps to choose the moments where important steps happen.
3. Extract one frame per chosen moment, in chronological order.
4. Write a summary that would help someone learn the process.

Reply with a JSON object and nothing else:
{"summary": string, "key_steps": [{"description": string, "timestamp": "MM:SS", "frame": string}], "frames_dir": string}
"key_steps" may be empty if no clear steps exist. "frames_dir" must be the directory returned by extract_video_frames."#;

const EDITING_SYSTEM: &str = r#"You turn a directory of key frames into a short highlight video.

Tools:
- create_video_from_frames: build a slideshow video from the frames with one text overlay per frame

Workflow:
1. Write one short caption per key step, in order. The first caption may double as a title.
2. Call create_video_from_frames once with the frames directory and the captions as text_overlays. Leave output_path, fps and duration_per_frame null to use defaults.
3. Keep the total length under {{max_duration}} seconds.

Reply with a JSON object and nothing else:
{"output_video_path": string, "duration": integer seconds, "frame_count": integer}"#;

impl Default for Prompts {
    fn default() -> Self {
        Self {
            search: AgentPrompt::new(SEARCH_SYSTEM),
            download: AgentPrompt::new(DOWNLOAD_SYSTEM),
            understanding: AgentPrompt::new(UNDERSTANDING_SYSTEM),
            editing: AgentPrompt::new(EDITING_SYSTEM),
            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            for (file, slot) in [
                ("search.toml", &mut prompts.search),
                ("download.toml", &mut prompts.download),
                ("understanding.toml", &mut prompts.understanding),
                ("editing.toml", &mut prompts.editing),
            ] {
                let path = custom_path.join(file);
                if path.exists() {
                    let content = std::fs::read_to_string(&path)?;
                    *slot = toml::from_str(&content)?;
                }
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
