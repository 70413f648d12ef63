//! Blocker ingestion and lookup handlers

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use visionproxy_core::models::{Blocker, NewBlocker};

use super::video_ref;
use crate::error::{HttpAppError, ValidatedJson, ValidatedQuery};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub id: String,
    #[serde(default)]
    pub platform: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockers: Option<Vec<Blocker>>,
}

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub video_id: String,
    #[serde(default)]
    pub platform: Option<String>,
    pub blockers: Vec<NewBlocker>,
}

#[derive(Debug, Serialize)]
pub struct AddResponse {
    pub success: bool,
    pub inserted: usize,
}

/// Blockers recorded for a video, if any.
#[tracing::instrument(skip(state))]
pub async fn check_video(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<CheckQuery>,
) -> Result<Json<CheckResponse>, HttpAppError> {
    let video = video_ref(&query.id, query.platform.as_deref())?;

    let Some(video_pk) = state.video_repository.find_id(&video).await? else {
        return Ok(Json(CheckResponse {
            found: false,
            blockers: None,
        }));
    };

    let blockers = state.blocker_repository.list_for_video(video_pk).await?;
    if blockers.is_empty() {
        return Ok(Json(CheckResponse {
            found: false,
            blockers: None,
        }));
    }

    tracing::debug!(video_ref = %video, count = blockers.len(), "Blockers found");
    Ok(Json(CheckResponse {
        found: true,
        blockers: Some(blockers),
    }))
}

/// Record blockers for a video, creating the video on first use.
#[tracing::instrument(skip(state, request), fields(video_id = %request.video_id, count = request.blockers.len()))]
pub async fn add_blockers(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<AddRequest>,
) -> Result<Json<AddResponse>, HttpAppError> {
    let video = video_ref(&request.video_id, request.platform.as_deref())?;

    let (_, inserted) = state
        .blocker_repository
        .add_for_video(&state.video_repository, &video, &request.blockers)
        .await?;

    Ok(Json(AddResponse {
        success: true,
        inserted,
    }))
}
