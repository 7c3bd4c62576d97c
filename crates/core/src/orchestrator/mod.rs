//! Job orchestrator.
//!
//! `JobOrchestrator::submit` claims the single job slot, classifies the input
//! and runs the matching pipeline on a background task:
//! - **Image**: annotate once and write to the output path
//! - **Video**: frame pipeline into `<temp_dir>/<job_id>_<output name>`,
//!   final encode by the `Transcoder`, then removal of the intermediate file
//!
//! The job always ends `completed` or `failed`, including when its task
//! panics.

mod handle;
mod runner;
mod temp;

pub use handle::JobHandle;
pub use runner::JobOrchestrator;
pub use temp::TempArtifact;
