//! Domain constants

/// Placeholder written by the recording client for every new blocker. A blocker
/// still carrying it has no generated description yet.
pub const DEFAULT_DESCRIPTION: &str = "Hidden part is too short for a description";

/// Blockers shorter than this never get a generated description.
pub const MIN_DESCRIBABLE_DURATION_MS: i64 = 4500;

/// Time the viewer needs before they start reading an overlay.
pub const READING_START_BUFFER_MS: i64 = 1500;

/// Extracted clips are downscaled to at most this height.
pub const MAX_CLIP_HEIGHT: u32 = 480;

/// Extracted clips are normalized to this frame rate.
pub const CLIP_FPS: u32 = 24;
