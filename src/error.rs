//! Error types for Stepreel.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for Stepreel operations.
#[derive(Error, Debug)]
pub enum StepreelError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    /// A subprocess exited non-zero. Carries the captured stderr.
    #[error("{tool} exited with {}: {stderr}", exit_label(.code))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// A nominally successful call left no output file behind.
    #[error("Expected artifact is missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Audio extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("No video URL found in search reply: {0}")]
    SearchExtraction(String),

    #[error("Slideshow assembly failed: {0}")]
    Slideshow(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Agent output did not match the {schema} schema: {reason}")]
    SchemaMismatch { schema: String, reason: String },

    #[error("Agent exceeded its turn budget ({0})")]
    TurnBudgetExceeded(usize),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl StepreelError {
    /// Stderr captured from a failed subprocess, if this error carries one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            StepreelError::ToolFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

/// Result type alias for Stepreel operations.
pub type Result<T> = std::result::Result<T, StepreelError>;
