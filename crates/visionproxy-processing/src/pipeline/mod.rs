//! Generation pipeline: per-video orchestration of extraction, captioning and
//! persistence.

mod orchestrator;
mod service;

use async_trait::async_trait;
use visionproxy_core::PersistenceError;
use visionproxy_db::BlockerRepository;

pub use orchestrator::Orchestrator;
pub use service::{GenerationService, VIDEO_NOT_FOUND};

/// Destination for generated descriptions.
#[async_trait]
pub trait DescriptionStore: Send + Sync {
    async fn save_description(
        &self,
        blocker_id: i64,
        description: &str,
    ) -> Result<(), PersistenceError>;
}

#[async_trait]
impl DescriptionStore for BlockerRepository {
    async fn save_description(
        &self,
        blocker_id: i64,
        description: &str,
    ) -> Result<(), PersistenceError> {
        BlockerRepository::save_description(self, blocker_id, description).await
    }
}
