//! Database repositories for data access layer
//
// Video identity lookups and upserts
pub mod video;
//
// Blocker listing, ingestion and description updates
pub mod blocker;

pub use blocker::BlockerRepository;
pub use video::VideoRepository;
