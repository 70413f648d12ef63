//! Description generation trigger

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use visionproxy_core::models::RunReport;
use visionproxy_core::AppError;

use super::video_ref;
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub video_id: String,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
}

impl From<RunReport> for GenerateResponse {
    fn from(report: RunReport) -> Self {
        Self {
            success: report.success,
            error: report.error.clone(),
            report: Some(report),
        }
    }
}

/// Generate descriptions for every eligible blocker of a video.
///
/// Runs to completion before responding. Server shutdown, or the client going
/// away, cancels the run.
#[tracing::instrument(skip(state, request), fields(video_id = %request.video_id))]
pub async fn generate_descriptions(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, HttpAppError> {
    let video = video_ref(&request.video_id, request.platform.as_deref())?;

    match state
        .generation
        .generate_for_video(&video, state.shutdown.child_token())
        .await
    {
        Ok(report) => Ok(Json(GenerateResponse::from(report))),
        Err(AppError::NotFound(message)) => {
            tracing::info!(video_ref = %video, "Generation requested for unknown video");
            Ok(Json(GenerateResponse {
                success: false,
                error: Some(message),
                report: None,
            }))
        }
        Err(e) => Err(e.into()),
    }
}
