use std::path::Path;
use std::time::Instant;

use crate::compliance::domain::frame_aggregator::FrameAggregator;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::pipeline::artifact_paths::{artifact_path, ArtifactKind};
use crate::pipeline::monitor_error::MonitorError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::session_controller::{
    conclude, outcome_reason, MonitorSession, SessionFault, SessionOutcome, StopReason,
};
use crate::pipeline::session_summary::{SessionMode, SessionSummary};
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Finite video: annotate every frame into `monitored_<timestamp>.mp4`.
///
/// The session stops at end of stream or at the first failed read; both
/// finalise normally.
pub struct MonitorVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    detector: Box<dyn ObjectDetector>,
    renderer: Box<dyn OverlayRenderer>,
    aggregator: FrameAggregator,
    confidence_threshold: f32,
    logger: Box<dyn PipelineLogger>,
}

impl MonitorVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn ObjectDetector>,
        renderer: Box<dyn OverlayRenderer>,
        aggregator: FrameAggregator,
        confidence_threshold: f32,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            detector,
            renderer,
            aggregator,
            confidence_threshold,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<SessionSummary, MonitorError> {
        let metadata = self.reader.open(input_path)?;
        self.logger.info(&format!(
            "Processing {}: {}x{} @ {:.1} fps, {} frames",
            input_path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames
        ));

        let mut session = MonitorSession::new(
            self.detector.as_mut(),
            self.renderer.as_ref(),
            &self.aggregator,
            self.confidence_threshold,
        );
        session.start();

        let output = artifact_path(
            output_dir,
            ArtifactKind::VideoResult,
            chrono::Local::now().naive_local(),
        );
        let target = output.display().to_string();

        let outcome = match self.writer.open(&output, &metadata) {
            Ok(()) => {
                let outcome = run_frames(
                    self.reader.as_mut(),
                    self.writer.as_mut(),
                    &mut session,
                    self.logger.as_mut(),
                    metadata.total_frames,
                    &target,
                );
                let closed = self.writer.close();
                match (outcome, closed) {
                    (Ok(_), Err(error)) => Err(SessionFault::Write {
                        target: target.clone(),
                        error,
                    }),
                    (outcome, Err(error)) => {
                        log::warn!("Closing {target} failed: {error}");
                        outcome
                    }
                    (outcome, Ok(())) => outcome,
                }
            }
            Err(error) => Err(SessionFault::Write {
                target: target.clone(),
                error,
            }),
        };
        self.reader.close();

        if let Err(fault) = &outcome {
            log::error!("{fault}");
        }

        let mut summary = session.finish(SessionMode::Video, outcome_reason(&outcome));
        if outcome.is_ok() {
            self.logger.info(&format!("Output saved: {target}"));
            summary.output = Some(output);
        }
        self.logger.summary();
        conclude(outcome, summary)
    }
}

/// Drives the session over every frame the reader yields.
fn run_frames(
    reader: &mut dyn VideoReader,
    writer: &mut dyn VideoWriter,
    session: &mut MonitorSession<'_>,
    logger: &mut dyn PipelineLogger,
    total_frames: usize,
    target: &str,
) -> SessionOutcome {
    for (i, item) in reader.frames().enumerate() {
        let mut frame = match item {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Reading frame {i} failed: {e}");
                return Ok(StopReason::ReadFailure);
            }
        };

        session.process(&mut frame, logger)?;

        let t0 = Instant::now();
        writer.write(&frame).map_err(|error| SessionFault::Write {
            target: target.to_string(),
            error,
        })?;
        logger.timing("write", t0.elapsed().as_secs_f64() * 1000.0);
        logger.progress(i + 1, total_frames);
    }
    Ok(StopReason::EndOfStream)
}
