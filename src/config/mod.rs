//! Configuration module for Stepreel.
//!
//! Handles loading application settings and agent instructions.

mod prompts;
mod settings;

pub use prompts::{AgentPrompt, Prompts};
pub use settings::{
    AgentSettings, GeneralSettings, MediaSettings, PromptSettings, Settings, SlideshowSettings,
    TranscriptionSettings,
};
