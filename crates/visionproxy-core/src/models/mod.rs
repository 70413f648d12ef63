//! Domain models

pub mod blocker;
pub mod outcome;
pub mod video;

pub use blocker::{Blocker, NewBlocker};
pub use outcome::{Decision, GenerationOutcome, RunReport, SkipReason, Stage, NO_BLOCKERS_FOUND};
pub use video::{Platform, VideoRef};
