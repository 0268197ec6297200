//! Parsing of the model's free-text reply.
//!
//! The reply is untrusted: it may be bare JSON, JSON inside a Markdown code fence, or
//! something else entirely. Parsing happens in two stages, fence stripping and then strict
//! JSON decoding into [`TimestampEntry`] values. [`normalize`] wraps both and never fails;
//! problems come back as [`Analysis::Failed`].

use serde::{Deserialize, Serialize};

use crate::{Result, TimestamperError};

/// One described moment of the video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampEntry {
    /// Offset in `HH:MM:SS`
    pub timestamp: String,

    /// Short witty description of what happens at the offset
    pub description: String,
}

/// Ordered entries produced for one video
pub type AnalysisResult = Vec<TimestampEntry>;

/// Outcome of analysing one video
#[derive(Debug)]
pub enum Analysis {
    /// The reply parsed; entries may still be empty if the model returned `[]`
    Complete(AnalysisResult),

    /// The remote call or the parse failed. The error is always recoverable.
    Failed(TimestamperError),
}

impl Analysis {
    /// Entries of a complete analysis, or an empty slice for a failed one
    pub fn entries(&self) -> &[TimestampEntry] {
        match self {
            Analysis::Complete(entries) => entries,
            Analysis::Failed(_) => &[],
        }
    }

    pub fn into_entries(self) -> AnalysisResult {
        match self {
            Analysis::Complete(entries) => entries,
            Analysis::Failed(_) => Vec::new(),
        }
    }

    pub fn failure(&self) -> Option<&TimestamperError> {
        match self {
            Analysis::Complete(_) => None,
            Analysis::Failed(err) => Some(err),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Analysis::Complete(_))
    }
}

const FENCE: &str = "```";

/// Remove a surrounding Markdown code fence (optionally tagged `json`) if present
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();

    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };

    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };

    rest.strip_suffix(FENCE).unwrap_or(rest).trim()
}

/// Strictly parse the reply into entries
pub fn parse_entries(raw: &str) -> Result<AnalysisResult> {
    let text = strip_code_fence(raw);

    if text.is_empty() {
        return Err(TimestamperError::MalformedResponse(
            "model returned an empty response".to_string(),
        ));
    }

    serde_json::from_str::<AnalysisResult>(text)
        .map_err(|e| TimestamperError::MalformedResponse(e.to_string()))
}

/// Parse the reply, turning any failure into [`Analysis::Failed`]
pub fn normalize(raw: &str) -> Analysis {
    match parse_entries(raw) {
        Ok(entries) => {
            tracing::debug!("Parsed {} timestamp entries", entries.len());
            Analysis::Complete(entries)
        }
        Err(err) => {
            tracing::warn!("Could not parse model response: {}", err);
            tracing::debug!("Raw model response: {}", raw);
            Analysis::Failed(err)
        }
    }
}
