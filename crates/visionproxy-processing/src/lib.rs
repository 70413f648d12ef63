//! Description generation pipeline
//!
//! Clip extraction (ffmpeg), caption inference (HTTP captioning service) and the
//! orchestrator that runs both for every eligible blocker of a video.

pub mod caption;
pub mod clip;
pub mod pipeline;

pub use caption::{CaptionClient, Captioner};
pub use clip::{ClipArtifact, ClipRange, ClipSource, FfmpegClipExtractor};
pub use pipeline::{DescriptionStore, GenerationService, Orchestrator, VIDEO_NOT_FOUND};
