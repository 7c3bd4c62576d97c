pub mod annotator;
pub mod config;
pub mod job;
pub mod media;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod testing;
pub mod transcoder;

pub use annotator::{
    create_annotator, Annotator, AnnotatorError, HttpAnnotator, PassthroughAnnotator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AnnotatorBackend, Config, ConfigError,
    SanitizedConfig,
};
pub use job::{JobError, JobSnapshot, JobState, JobStatus, SubmitError};
pub use media::{FfmpegMediaBackend, MediaBackend, MediaKind};
pub use orchestrator::{JobHandle, JobOrchestrator};
pub use transcoder::{FfmpegTranscoder, Transcoder, TranscoderError};
