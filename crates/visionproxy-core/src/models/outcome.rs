use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

use super::video::VideoRef;

/// Error reported when a run is requested for a video that has no blockers.
pub const NO_BLOCKERS_FOUND: &str = "no blockers found";

/// Why a blocker was not sent through generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TooShort,
    AlreadyDescribed,
    Cancelled,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SkipReason::TooShort => write!(f, "too_short"),
            SkipReason::AlreadyDescribed => write!(f, "already_described"),
            SkipReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Pipeline stage a blocker failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extraction,
    Inference,
    Persistence,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Stage::Extraction => write!(f, "extraction"),
            Stage::Inference => write!(f, "inference"),
            Stage::Persistence => write!(f, "persistence"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Skipped { reason: SkipReason },
    Generated { description: String },
    Failed { stage: Stage, reason: String },
}

/// Result for one blocker in one run. Built fresh per run, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub blocker_id: i64,
    #[serde(flatten)]
    pub decision: Decision,
}

impl GenerationOutcome {
    pub fn skipped(blocker_id: i64, reason: SkipReason) -> Self {
        Self {
            blocker_id,
            decision: Decision::Skipped { reason },
        }
    }

    pub fn generated(blocker_id: i64, description: impl Into<String>) -> Self {
        Self {
            blocker_id,
            decision: Decision::Generated {
                description: description.into(),
            },
        }
    }

    pub fn failed(blocker_id: i64, stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            blocker_id,
            decision: Decision::Failed {
                stage,
                reason: reason.into(),
            },
        }
    }
}

/// Aggregated result of one generation run over a video's blockers.
///
/// `outcomes` keeps the order of the blocker list the run started from,
/// whatever order the blockers finished in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub video: VideoRef,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcomes: Vec<GenerationOutcome>,
}

impl RunReport {
    /// Run that never started because the video has no blockers.
    pub fn no_blockers(run_id: Uuid, video: VideoRef, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            video,
            success: false,
            error: Some(NO_BLOCKERS_FOUND.to_string()),
            started_at,
            finished_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn completed(
        run_id: Uuid,
        video: VideoRef,
        started_at: DateTime<Utc>,
        outcomes: Vec<GenerationOutcome>,
    ) -> Self {
        Self {
            run_id,
            video,
            success: true,
            error: None,
            started_at,
            finished_at: Utc::now(),
            outcomes,
        }
    }

    pub fn generated(&self) -> usize {
        self.count(|d| matches!(d, Decision::Generated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|d| matches!(d, Decision::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|d| matches!(d, Decision::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&Decision) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.decision)).count()
    }
}
