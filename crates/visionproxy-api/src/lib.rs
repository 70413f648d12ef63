//! VisionProxy API library
//!
//! HTTP handlers, application state and setup for the blocker description service.

pub mod error;
mod handlers;
pub mod setup;
pub mod state;
mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
