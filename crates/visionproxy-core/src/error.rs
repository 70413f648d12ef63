//! Error types module
//!
//! Two families live here. `AppError` covers request-level failures (bad input,
//! missing rows, database faults) and knows how it should be presented over HTTP.
//! `ExtractionError`, `InferenceError` and `PersistenceError` are per-blocker
//! stage failures; the pipeline turns them into outcome entries and never lets
//! them abort a run.
//!
//! The `Database`/`Connection` variants carry a `sqlx::Error` when the `sqlx`
//! feature is enabled and a plain message otherwise.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DATABASE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::Database(_) => 500,
            AppError::InvalidInput(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Internal(_) | AppError::InternalWithSource { .. } => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "INTERNAL_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Database(_))
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::NotFound(_) => LogLevel::Debug,
            AppError::Database(_) | AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                LogLevel::Error
            }
        }
    }
}

/// Failure of the external media-extraction step for one blocker.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailure {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("Failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{tool} timed out after {after_secs}s")]
    Timeout { tool: &'static str, after_secs: u64 },

    #[error("Clip workspace error: {0}")]
    Io(#[from] io::Error),
}

impl ExtractionError {
    /// Taxonomy tag used in logs and outcome reasons.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::Timeout { .. } => "timeout",
            _ => "tool_failure",
        }
    }

    /// A crashed or slow tool run may succeed on a second attempt; a missing
    /// binary or an unusable scratch directory will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractionError::ToolFailure { .. } | ExtractionError::Timeout { .. }
        )
    }
}

/// Failure of the external captioning step for one blocker.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Caption request timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error("Caption request failed: {0}")]
    Transport(String),

    #[error("Caption service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed caption response: {0}")]
    MalformedResponse(String),

    #[error("Caption service returned an empty description")]
    EmptyResult,

    #[error("Failed to read clip: {0}")]
    ClipUnreadable(#[source] io::Error),
}

impl InferenceError {
    /// Taxonomy tag used in logs and outcome reasons.
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::Timeout { .. } => "timeout",
            InferenceError::EmptyResult => "empty_result",
            InferenceError::MalformedResponse(_) => "malformed_response",
            InferenceError::Transport(_)
            | InferenceError::Status { .. }
            | InferenceError::ClipUnreadable(_) => "capability_error",
        }
    }

    /// Decoding is greedy, so a malformed or empty answer would come back the
    /// same; only transport-level failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            InferenceError::Timeout { .. } | InferenceError::Transport(_) => true,
            InferenceError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Failure to store a generated description.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("No blocker row with id {blocker_id} was updated")]
    NoRowAffected { blocker_id: i64 },

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Connection(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Connection(String),
}

impl PersistenceError {
    pub fn kind(&self) -> &'static str {
        match self {
            PersistenceError::NoRowAffected { .. } => "no_row_affected",
            PersistenceError::Connection(_) => "connection_failure",
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for PersistenceError {
    fn from(err: SqlxError) -> Self {
        PersistenceError::Connection(err)
    }
}
