use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DESCRIPTION;
use crate::error::AppError;

/// A time range of a video that the client hid from the viewer.
///
/// Rows are read once per generation run; the pipeline never re-reads a blocker
/// it has already decided on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Blocker {
    pub id: i64,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub description: String,
}

impl Blocker {
    /// Visible length of the blocker. Never stored, always derived.
    pub fn duration_ms(&self) -> i64 {
        self.end_time_ms - self.start_time_ms
    }

    /// Whether the description is still the placeholder set at recording time.
    pub fn has_default_description(&self) -> bool {
        self.description.trim() == DEFAULT_DESCRIPTION
    }
}

/// Blocker as submitted by the recording client, before it has an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBlocker {
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewBlocker {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.start_time_ms < 0 {
            return Err(AppError::InvalidInput(
                "start_time_ms must be non-negative".into(),
            ));
        }
        if self.end_time_ms <= self.start_time_ms {
            return Err(AppError::InvalidInput(format!(
                "end_time_ms ({}) must be greater than start_time_ms ({})",
                self.end_time_ms, self.start_time_ms
            )));
        }
        Ok(())
    }

    /// Description to store: the submitted one, or the placeholder when absent or blank.
    pub fn description_or_default(&self) -> &str {
        match self.description.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text,
            _ => DEFAULT_DESCRIPTION,
        }
    }
}
