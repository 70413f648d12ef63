//! Decides which blockers get a generated description.

use crate::constants::{MIN_DESCRIBABLE_DURATION_MS, READING_START_BUFFER_MS};
use crate::models::{Blocker, SkipReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Process,
    Skip(SkipReason),
}

/// A blocker is processed iff it is at least [`MIN_DESCRIBABLE_DURATION_MS`] long
/// and its trimmed description is still the recording placeholder.
///
/// Length is checked first: a short blocker is `too_short` whatever its description.
pub fn evaluate(blocker: &Blocker) -> Eligibility {
    if blocker.duration_ms() < MIN_DESCRIBABLE_DURATION_MS {
        return Eligibility::Skip(SkipReason::TooShort);
    }
    if !blocker.has_default_description() {
        return Eligibility::Skip(SkipReason::AlreadyDescribed);
    }
    Eligibility::Process
}

/// Seconds the viewer has to read a description: the blocker's duration minus
/// the reading-start buffer, floored at zero.
pub fn reading_budget_seconds(duration_ms: i64) -> f64 {
    (duration_ms - READING_START_BUFFER_MS).max(0) as f64 / 1000.0
}
