//! Frame pipelines.
//!
//! - `VideoPipeline` decodes a video frame by frame, annotates each frame,
//!   writes the results to a raw intermediate file and reports progress.
//! - `ImagePipeline` annotates a single still image and writes it directly to
//!   the output path.
//!
//! Both return a `LatencyLog` of per-frame annotation latencies.

mod config;
mod image;
mod video;

pub use config::PipelineConfig;
pub use image::ImagePipeline;
pub use video::{percent_of, VideoPipeline};
