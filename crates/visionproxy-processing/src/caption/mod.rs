//! Caption inference: turns a clip into a one-sentence scene description.

mod answer;
mod client;

use async_trait::async_trait;
use visionproxy_core::InferenceError;

use crate::clip::ClipArtifact;

pub use answer::{build_prompt, extract_answer};
pub use client::CaptionClient;

/// Video-captioning capability.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Describe `clip` in a sentence that can be read in about
    /// `reading_budget_seconds`.
    async fn describe(
        &self,
        clip: &ClipArtifact,
        reading_budget_seconds: f64,
    ) -> Result<String, InferenceError>;
}
