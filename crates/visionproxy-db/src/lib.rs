//! VisionProxy database access
//!
//! Repositories over the `video` and `blocker` tables. Each repository holds a
//! clone of the shared `PgPool`; the pool is built once at startup and handed in.

pub mod db;

pub use db::{BlockerRepository, VideoRepository};
