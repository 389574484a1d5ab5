//! Adapters over external media tools (yt-dlp, ffmpeg, ffprobe).
//!
//! Every adapter runs its tool through a [`ToolRunner`], so each call has a
//! deadline and a bounded retry. Failures come back as tagged
//! [`StepreelError`](crate::error::StepreelError) values carrying the tool's
//! stderr; deciding whether one is fatal is left to the caller.

pub mod audio;
pub mod downloader;
pub mod frames;
pub mod library;
pub mod process;
pub mod slideshow;
pub mod timestamp;

pub use audio::{
    convert_for_transcription, extract_audio_track, AudioTrack, ConversionOptions, ScratchAudio,
};
pub use downloader::{download_video, search_videos, verify_video_url, DownloadedVideo, VideoCandidate, VideoInfo};
pub use frames::{extract_frames, ExtractedFrame, FrameExtraction};
pub use library::{list_available_videos, resolve_video, tool_versions, LibraryVideo, ToolVersion};
pub use process::{ToolOutput, ToolRunner};
pub use slideshow::{assemble_slideshow, Slideshow, SlideshowOptions, TextOverlay};
pub use timestamp::{seconds_to_timestamp, timestamp_to_seconds};
