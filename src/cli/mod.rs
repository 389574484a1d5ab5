//! CLI module for Stepreel.

pub mod commands;
mod output;
pub mod preflight;
mod status;

pub use output::Output;
pub use status::StatusReporter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stepreel - key-steps highlight videos
///
/// Finds a how-to video, downloads and transcribes it, works out the key
/// steps, and cuts a short slideshow of them. Without a subcommand the full
/// pipeline runs.
#[derive(Parser, Debug)]
#[command(name = "stepreel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// What to find and summarize
    #[arg(short, long)]
    pub query: Option<String>,

    /// Use a video already in the videos directory instead of searching
    #[arg(long)]
    pub video: Option<String>,

    /// Maximum length of the highlight video in seconds
    #[arg(short = 'd', long, default_value = "300")]
    pub max_duration: u32,

    /// Print plain progress lines instead of live spinners
    #[arg(long)]
    pub no_pretty: bool,

    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check external tools, credentials and directories
    Doctor,

    /// Transcribe one audio file and write its transcript JSON
    Transcribe {
        /// Path to an audio file
        audio: PathBuf,
    },
}
