//! Stage controller for one highlight-video request.
//!
//! Stages run strictly in sequence: search and download (skipped for a
//! local video), transcription, understanding, then editing. After each
//! stage the controller re-checks that the artifacts the next stage needs
//! exist on disk, and otherwise stops with a partial [`Report`]. Progress is
//! published on a [`RunTrace`] channel and never affects control flow.

mod controller;
mod events;
mod models;
mod report;

pub use controller::Pipeline;
pub use events::{EventKind, RunEvent, RunTrace, Stage};
pub use models::{PipelineRequest, DEFAULT_QUERY};
pub use report::{format_key_steps, Report};
