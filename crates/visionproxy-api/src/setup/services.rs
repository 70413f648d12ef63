//! Repository and pipeline wiring

use crate::state::AppState;
use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use visionproxy_core::Config;
use visionproxy_db::{BlockerRepository, VideoRepository};
use visionproxy_processing::{CaptionClient, FfmpegClipExtractor, GenerationService, Orchestrator};

/// Build repositories, the clip extractor, the caption client and the orchestrator.
///
/// Nothing here touches the network, so a lazily connected pool is enough.
pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    shutdown: CancellationToken,
) -> Result<Arc<AppState>> {
    let video_repository = VideoRepository::new(pool.clone());
    let blocker_repository = BlockerRepository::new(pool.clone());

    let clips = FfmpegClipExtractor::new(config.clip.clone())
        .context("Failed to initialize clip extractor")?;
    let captioner = CaptionClient::new(config.caption.clone())
        .context("Failed to initialize caption client")?;

    let orchestrator = Orchestrator::new(
        Arc::new(clips),
        Arc::new(captioner),
        Arc::new(blocker_repository.clone()),
        &config.pipeline,
    );
    let generation = GenerationService::new(
        video_repository.clone(),
        blocker_repository.clone(),
        orchestrator,
    );

    tracing::info!(
        ffmpeg_path = %config.clip.ffmpeg_path,
        ytdlp = config.clip.ytdlp_path.is_some(),
        scratch_dir = %config.clip.scratch_dir.display(),
        caption_service = %config.caption.service_url,
        max_concurrency = config.pipeline.max_concurrency,
        "Generation pipeline ready"
    );

    Ok(Arc::new(AppState {
        pool,
        video_repository,
        blocker_repository,
        generation,
        shutdown,
    }))
}
