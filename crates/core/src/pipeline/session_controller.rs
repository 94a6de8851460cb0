use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::compliance::domain::frame_aggregator::{FrameAggregator, FrameAnalysis};
use crate::compliance::domain::session_stats::SessionStats;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::overlay::domain::overlay_content::OverlayContent;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::shared::frame::Frame;

use super::monitor_error::MonitorError;
use super::pipeline_logger::PipelineLogger;
use super::session_summary::{SessionMode, SessionSummary};

/// Why a session reached `Stopped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Single-image session finished its one frame.
    Completed,
    /// The source ran out of frames.
    EndOfStream,
    /// A frame read failed mid-stream; handled like end of stream.
    ReadFailure,
    /// A quit command arrived.
    UserRequested,
    /// An output artifact could not be produced.
    SinkFailure,
    /// The detector returned an error.
    DetectionFailure,
    /// A frame was submitted to a session that was not running.
    InvalidState,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Completed => "completed",
            StopReason::EndOfStream => "end of stream",
            StopReason::ReadFailure => "frame read failed",
            StopReason::UserRequested => "stopped by user",
            StopReason::SinkFailure => "output write failed",
            StopReason::DetectionFailure => "detector failed",
            StopReason::InvalidState => "session was not running",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Stopped(StopReason),
}

/// A failure that ends a running session early.
#[derive(Debug, thiserror::Error)]
pub enum SessionFault {
    #[error("detector failed: {0}")]
    Detection(Box<dyn std::error::Error>),

    #[error("overlay rendering failed: {0}")]
    Render(Box<dyn std::error::Error>),

    #[error("cannot write {target}: {error}")]
    Write {
        target: String,
        error: Box<dyn std::error::Error>,
    },

    #[error("session is {0:?}, not running")]
    NotRunning(SessionState),
}

impl SessionFault {
    pub fn stop_reason(&self) -> StopReason {
        match self {
            SessionFault::Detection(_) => StopReason::DetectionFailure,
            SessionFault::Render(_) | SessionFault::Write { .. } => StopReason::SinkFailure,
            SessionFault::NotRunning(_) => StopReason::InvalidState,
        }
    }

    /// Attaches the finalised summary to form the caller-facing error.
    pub fn into_monitor_error(self, summary: SessionSummary) -> MonitorError {
        let summary = Box::new(summary);
        match self {
            SessionFault::Detection(e) => MonitorError::DetectionFailure {
                reason: e.to_string(),
                summary,
            },
            SessionFault::Render(e) => MonitorError::SinkFailure {
                target: "annotated frame".to_string(),
                reason: e.to_string(),
                summary,
            },
            SessionFault::Write { target, error } => MonitorError::SinkFailure {
                target,
                reason: error.to_string(),
                summary,
            },
            SessionFault::NotRunning(state) => MonitorError::InvalidState {
                state: format!("{state:?}"),
                summary,
            },
        }
    }
}

/// How a session loop ended: a normal stop or a fault.
pub type SessionOutcome = Result<StopReason, SessionFault>;

/// Stop reason recorded for an outcome.
pub fn outcome_reason(outcome: &SessionOutcome) -> StopReason {
    match outcome {
        Ok(reason) => *reason,
        Err(fault) => fault.stop_reason(),
    }
}

/// Pairs a finalised summary with its outcome.
pub fn conclude(outcome: SessionOutcome, summary: SessionSummary) -> Result<SessionSummary, MonitorError> {
    match outcome {
        Ok(_) => Ok(summary),
        Err(fault) => Err(fault.into_monitor_error(summary)),
    }
}

/// Detections and classification of one processed frame.
#[derive(Clone, Debug)]
pub struct FrameReport {
    pub detections: Vec<Detection>,
    pub analysis: FrameAnalysis,
}

/// One monitoring session: the `Idle → Running → Stopped` state machine and
/// the detect → aggregate → record → render step shared by every controller.
///
/// Each session owns a fresh [`SessionStats`]; collaborators are borrowed
/// from the controller that runs it.
pub struct MonitorSession<'a> {
    detector: &'a mut dyn ObjectDetector,
    renderer: &'a dyn OverlayRenderer,
    aggregator: &'a FrameAggregator,
    confidence_threshold: f32,
    stats: SessionStats,
    state: SessionState,
}

impl<'a> MonitorSession<'a> {
    pub fn new(
        detector: &'a mut dyn ObjectDetector,
        renderer: &'a dyn OverlayRenderer,
        aggregator: &'a FrameAggregator,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            detector,
            renderer,
            aggregator,
            confidence_threshold,
            stats: SessionStats::new(),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// `Idle → Running`. Has no effect in any other state.
    pub fn start(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::Running;
        }
    }

    /// Runs the shared per-frame step and draws the overlay onto `frame`.
    ///
    /// Detections scoring under the confidence threshold are discarded even
    /// if the detector returned them. The frame is recorded in the session
    /// stats before rendering, so a render fault still counts it.
    pub fn process(
        &mut self,
        frame: &mut Frame,
        logger: &mut dyn PipelineLogger,
    ) -> Result<FrameReport, SessionFault> {
        if self.state != SessionState::Running {
            return Err(SessionFault::NotRunning(self.state));
        }

        let t0 = Instant::now();
        let mut detections = self
            .detector
            .detect(frame, self.confidence_threshold)
            .map_err(SessionFault::Detection)?;
        detections.retain(|d| d.confidence >= self.confidence_threshold);
        logger.timing("detect", t0.elapsed().as_secs_f64() * 1000.0);
        logger.metric("detections", detections.len() as f64);

        let analysis = self.aggregator.aggregate(&detections);
        self.stats
            .record_frame(&analysis.tally, &analysis.violations);

        let t0 = Instant::now();
        let content = OverlayContent::build(
            &analysis.tally,
            &analysis.violations,
            chrono::Local::now().naive_local(),
        );
        self.renderer
            .render(frame, &detections, &analysis, &content)
            .map_err(SessionFault::Render)?;
        logger.timing("render", t0.elapsed().as_secs_f64() * 1000.0);

        Ok(FrameReport {
            detections,
            analysis,
        })
    }

    /// `→ Stopped(reason)` and the summary of everything recorded so far.
    ///
    /// A second call keeps the first stop reason.
    pub fn finish(&mut self, mode: SessionMode, reason: StopReason) -> SessionSummary {
        let reason = match self.state {
            SessionState::Stopped(first) => first,
            SessionState::Idle | SessionState::Running => {
                self.state = SessionState::Stopped(reason);
                reason
            }
        };
        log::debug!(
            "Session stopped ({reason}) after {} frames",
            self.stats.frames_processed()
        );
        SessionSummary::from_stats(mode, reason, &self.stats)
    }
}
