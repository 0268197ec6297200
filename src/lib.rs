//! Video Timestamper - witty timestamped moments for long YouTube videos
//!
//! This library plans a fixed set of offsets, asks a remote generative model (Gemini) to
//! describe the video at those offsets, and normalizes the reply into a list of
//! `timestamp - description` entries that can be printed or saved as text and JSON.

use std::path::PathBuf;

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod output;
pub mod plan;
pub mod prompt;
pub mod response;
pub mod utils;

pub use analyzer::{BatchItem, GeminiClient, Timestamper, VideoAnalyzer};
pub use cli::Cli;
pub use config::Config;
pub use output::{FormattedOutput, PersistedPaths};
pub use plan::TimestampPlan;
pub use response::{Analysis, AnalysisResult, TimestampEntry};

/// Result type used throughout the library
pub type Result<T, E = TimestamperError> = std::result::Result<T, E>;

/// Error types specific to the timestamper
#[derive(thiserror::Error, Debug)]
pub enum TimestamperError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Upstream model call failed: {0}")]
    UpstreamCall(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TimestamperError {
    /// Failures that leave an empty analysis behind instead of aborting the run
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TimestamperError::UpstreamCall(_) | TimestamperError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for TimestamperError {
    fn from(err: reqwest::Error) -> Self {
        TimestamperError::UpstreamCall(err.to_string())
    }
}
