//! CLI command implementations.

mod doctor;
mod run;
mod transcribe;

pub use doctor::run_doctor;
pub use run::{run_pipeline, RunArgs};
pub use transcribe::run_transcribe;
