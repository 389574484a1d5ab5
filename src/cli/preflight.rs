//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! a run that would otherwise fail midway.

use crate::error::{Result, StepreelError};
use crate::openai::API_KEY_ENV;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The full pipeline needs the provider credential for every agent.
    Pipeline,
    /// Standalone transcription needs the credential for Whisper.
    Transcribe,
    /// Diagnostics report problems instead of requiring anything.
    Doctor,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Pipeline | Operation::Transcribe => check_api_key(std::env::var(API_KEY_ENV).ok()),
        Operation::Doctor => Ok(()),
    }
}

fn check_api_key(value: Option<String>) -> Result<()> {
    match value {
        Some(key) if !key.is_empty() => Ok(()),
        Some(_) => Err(StepreelError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            API_KEY_ENV, API_KEY_ENV
        ))),
        None => Err(StepreelError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            API_KEY_ENV, API_KEY_ENV
        ))),
    }
}
