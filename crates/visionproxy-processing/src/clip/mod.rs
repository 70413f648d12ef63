//! Clip extraction: materializes the blocker's time range as a small video file.

mod ffmpeg;

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uuid::Uuid;

use visionproxy_core::models::{Blocker, VideoRef};
use visionproxy_core::ExtractionError;

pub use ffmpeg::FfmpegClipExtractor;

/// Time range of one blocker to cut out of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRange {
    pub blocker_id: i64,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
}

impl ClipRange {
    pub fn duration_ms(&self) -> i64 {
        self.end_time_ms - self.start_time_ms
    }
}

impl From<&Blocker> for ClipRange {
    fn from(blocker: &Blocker) -> Self {
        Self {
            blocker_id: blocker.id,
            start_time_ms: blocker.start_time_ms,
            end_time_ms: blocker.end_time_ms,
        }
    }
}

/// An extracted clip on disk.
///
/// Each artifact lives in its own temporary directory (random name under the
/// scratch root), so concurrent or retried extractions never share a path.
/// Dropping the artifact removes the directory and the clip with it.
#[derive(Debug)]
pub struct ClipArtifact {
    path: PathBuf,
    dir: TempDir,
}

impl ClipArtifact {
    /// Reserve a fresh, uniquely named location for a clip under `scratch_root`.
    pub fn allocate(scratch_root: &Path, blocker_id: i64) -> io::Result<Self> {
        std::fs::create_dir_all(scratch_root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("visionproxy-clip-{}-", blocker_id))
            .tempdir_in(scratch_root)?;
        let path = dir.path().join(format!("{}.mp4", Uuid::new_v4()));
        Ok(Self { path, dir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .unwrap_or_else(|| "clip.mp4".to_string())
    }

    /// Remove the artifact now and report failures, instead of the silent removal on drop.
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}

/// Media-extraction capability.
#[async_trait]
pub trait ClipSource: Send + Sync {
    /// Cut `range` out of `video`, video-only, at most 480px high and 24 fps.
    async fn extract(
        &self,
        video: &VideoRef,
        range: ClipRange,
    ) -> Result<ClipArtifact, ExtractionError>;
}
