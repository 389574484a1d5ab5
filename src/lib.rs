//! Stepreel - key-steps highlight videos from how-to footage
//!
//! Given a request like "show me the key steps of a squash serve", Stepreel
//! finds a suitable video, downloads it, transcribes the audio, asks an
//! agent to pick out the key steps and their frames, and assembles a short
//! slideshow of those steps.
//!
//! # Architecture
//!
//! - `config` - Settings and per-role agent instructions
//! - `media` - Wrappers around yt-dlp, ffmpeg and ffprobe
//! - `transcription` - Whisper transcription, key points, transcript sidecars
//! - `agent` - The agent boundary and its OpenAI tool-calling implementation
//! - `pipeline` - The stage controller, progress events and the final report
//! - `cli` - Command line surface
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stepreel::agent::OpenAiAgent;
//! use stepreel::config::{Prompts, Settings};
//! use stepreel::pipeline::{Pipeline, PipelineRequest};
//! use stepreel::transcription::AudioTranscriber;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let prompts = Prompts::load(None, None)?;
//!     let pipeline = Pipeline::from_settings(
//!         &settings,
//!         Arc::new(OpenAiAgent::from_settings(&settings, prompts)),
//!         Arc::new(AudioTranscriber::from_settings(&settings)),
//!     );
//!
//!     let report = pipeline
//!         .run(&PipelineRequest::new("How to tie a bowline knot").with_max_duration(60))
//!         .await;
//!     println!("{}", report);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod openai;
pub mod pipeline;
pub mod transcription;

pub use error::{Result, StepreelError};
