//! Pipeline inputs.

/// Request used when neither a query nor a local video is given.
pub const DEFAULT_QUERY: &str = "I want to see the key steps of how to play squash in a short video. \
Find a video for me (max duration 5 minutes), download it, then teach me how to do it and give me \
a short video of the key steps.";

/// One user request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequest {
    /// Natural-language description of the video wanted.
    pub query: String,
    /// Name of a video already in the videos directory, or a path to one.
    /// Skips search and download when set.
    pub video: Option<String>,
    /// Target length of the highlight video in seconds.
    pub max_duration: u32,
}

impl PipelineRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            video: None,
            max_duration: 300,
        }
    }

    pub fn with_video(mut self, video: impl Into<String>) -> Self {
        self.video = Some(video.into());
        self
    }

    pub fn with_max_duration(mut self, seconds: u32) -> Self {
        self.max_duration = seconds;
        self
    }
}

impl Default for PipelineRequest {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY)
    }
}
