use crate::video::domain::source_error::SourceError;

use super::session_summary::SessionSummary;

/// Fatal outcome of a monitoring session.
///
/// Source errors happen before any frame is processed and carry no summary.
/// Sink and detection failures happen mid-session; the session is still
/// finalised and its partial summary travels with the error.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(SourceError),

    #[error("unrecognized input: {0}")]
    UnrecognizedInput(SourceError),

    #[error("cannot write {target}: {reason}")]
    SinkFailure {
        target: String,
        reason: String,
        summary: Box<SessionSummary>,
    },

    #[error("detection failed: {reason}")]
    DetectionFailure {
        reason: String,
        summary: Box<SessionSummary>,
    },

    #[error("session is {state}, not running")]
    InvalidState {
        state: String,
        summary: Box<SessionSummary>,
    },
}

impl MonitorError {
    /// Partial session summary, when the session got far enough to have one.
    pub fn summary(&self) -> Option<&SessionSummary> {
        match self {
            MonitorError::SinkFailure { summary, .. }
            | MonitorError::DetectionFailure { summary, .. }
            | MonitorError::InvalidState { summary, .. } => Some(summary.as_ref()),
            MonitorError::SourceUnavailable(_) | MonitorError::UnrecognizedInput(_) => None,
        }
    }
}

impl From<SourceError> for MonitorError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Unavailable { .. } => MonitorError::SourceUnavailable(err),
            SourceError::Unrecognized { .. } => MonitorError::UnrecognizedInput(err),
        }
    }
}
