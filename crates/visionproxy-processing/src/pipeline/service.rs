use tokio_util::sync::CancellationToken;

use visionproxy_core::models::{RunReport, VideoRef};
use visionproxy_core::AppError;
use visionproxy_db::{BlockerRepository, VideoRepository};

use super::Orchestrator;

/// Message for runs requested against a video that was never recorded.
pub const VIDEO_NOT_FOUND: &str = "video not found";

/// Loads a video's blockers and hands them to the orchestrator.
#[derive(Clone)]
pub struct GenerationService {
    videos: VideoRepository,
    blockers: BlockerRepository,
    orchestrator: Orchestrator,
}

impl GenerationService {
    pub fn new(
        videos: VideoRepository,
        blockers: BlockerRepository,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            videos,
            blockers,
            orchestrator,
        }
    }

    /// Run generation for every blocker currently recorded for `video`.
    ///
    /// Only lookup failures are errors; everything that happens to individual
    /// blockers is in the returned report.
    pub async fn generate_for_video(
        &self,
        video: &VideoRef,
        cancel: CancellationToken,
    ) -> Result<RunReport, AppError> {
        let video_pk = self
            .videos
            .find_id(video)
            .await?
            .ok_or_else(|| AppError::NotFound(VIDEO_NOT_FOUND.to_string()))?;

        let blockers = self.blockers.list_for_video(video_pk).await?;
        tracing::info!(video_ref = %video, video_pk, blockers = blockers.len(), "Starting generation run");

        Ok(self.orchestrator.run(video, blockers, cancel).await)
    }
}
