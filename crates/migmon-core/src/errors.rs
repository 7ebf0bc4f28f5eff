//! Error types for the migration monitor core.
//!
//! Fetch-level failures carry the organization they were issued for so the
//! dashboard can surface a useful status message without inspecting the
//! underlying transport error.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("GitHub API request failed for organization '{organization}': {message}")]
    ApiError {
        organization: String,
        message: String,
    },
    #[error("HTTP transport error: {0}")]
    TransportError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl MonitorError {
    /// Wraps a lower-level failure with the organization it occurred for.
    pub fn api(organization: impl Into<String>, message: impl Into<String>) -> Self {
        MonitorError::ApiError {
            organization: organization.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        MonitorError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for MonitorError {
    fn from(err: reqwest::Error) -> Self {
        MonitorError::TransportError(err.to_string())
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        MonitorError::ParsingError(err.to_string())
    }
}
