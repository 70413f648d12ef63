//! HTTP client for the captioning service

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use visionproxy_core::{CaptionConfig, InferenceError};

use super::answer::{build_prompt, extract_answer};
use super::Captioner;
use crate::clip::ClipArtifact;

const ERROR_BODY_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
struct CaptionResponse {
    #[serde(alias = "text", alias = "output")]
    generated_text: String,
}

/// Posts clips to the captioning service as multipart forms.
pub struct CaptionClient {
    http_client: Client,
    config: CaptionConfig,
}

impl Debug for CaptionClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CaptionClient")
            .field("service_url", &self.config.service_url)
            .finish()
    }
}

impl CaptionClient {
    pub fn new(config: CaptionConfig) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client for caption service")?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn request(&self, form: Form) -> Result<String, InferenceError> {
        let mut request = self.http_client.post(&self.config.service_url).multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let body: CaptionResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;
        Ok(body.generated_text)
    }
}

#[async_trait]
impl Captioner for CaptionClient {
    #[tracing::instrument(skip(self, clip), fields(clip_path = %clip.path().display()))]
    async fn describe(
        &self,
        clip: &ClipArtifact,
        reading_budget_seconds: f64,
    ) -> Result<String, InferenceError> {
        let bytes = tokio::fs::read(clip.path())
            .await
            .map_err(InferenceError::ClipUnreadable)?;

        let clip_part = Part::bytes(bytes)
            .file_name(clip.file_name())
            .mime_str("video/mp4")
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let form = Form::new()
            .part("clip", clip_part)
            .text(
                "prompt",
                build_prompt(reading_budget_seconds, &self.config.answer_marker),
            )
            .text("max_new_tokens", self.config.max_new_tokens.to_string())
            .text("do_sample", "false");

        let limit = self.timeout();
        let raw = tokio::time::timeout(limit, self.request(form))
            .await
            .map_err(|_| InferenceError::Timeout {
                after_secs: limit.as_secs(),
            })??;

        let description = extract_answer(&raw, &self.config.answer_marker)?;
        tracing::debug!(chars = description.len(), "Caption generated");
        Ok(description)
    }
}

fn transport_error(err: reqwest::Error) -> InferenceError {
    InferenceError::Transport(err.to_string())
}
