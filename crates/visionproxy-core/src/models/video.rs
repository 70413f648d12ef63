use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::AppError;

/// Video hosting platform a blocker set was recorded on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Youtube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            other => Err(AppError::InvalidInput(format!(
                "Unsupported platform: {}",
                other
            ))),
        }
    }
}

/// Identity of a video: platform plus the platform-native id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoRef {
    pub platform: Platform,
    pub video_id: String,
}

impl VideoRef {
    /// Build a reference, rejecting ids that are empty or contain characters a
    /// platform id never has.
    pub fn new(platform: Platform, video_id: impl Into<String>) -> Result<Self, AppError> {
        let video_id = video_id.into();
        let trimmed = video_id.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput("video_id is required".to_string()));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::InvalidInput(format!(
                "Invalid video_id: {}",
                trimmed
            )));
        }
        Ok(Self {
            platform,
            video_id: trimmed.to_string(),
        })
    }

    /// Locator the media-extraction tooling reads the source from.
    pub fn source_url(&self) -> String {
        match self.platform {
            Platform::Youtube => format!("https://www.youtube.com/watch?v={}", self.video_id),
        }
    }
}

impl Display for VideoRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.platform, self.video_id)
    }
}
