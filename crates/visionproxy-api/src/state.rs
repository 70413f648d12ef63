//! Application state shared by all handlers.

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use visionproxy_db::{BlockerRepository, VideoRepository};
use visionproxy_processing::GenerationService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub video_repository: VideoRepository,
    pub blocker_repository: BlockerRepository,
    pub generation: GenerationService,
    /// Server-wide token; each generation run uses a child of it.
    pub shutdown: CancellationToken,
}
