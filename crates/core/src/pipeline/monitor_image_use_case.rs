use std::path::Path;

use crate::compliance::domain::frame_aggregator::FrameAggregator;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::pipeline::artifact_paths::{artifact_path, ArtifactKind};
use crate::pipeline::monitor_error::MonitorError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::session_controller::{
    conclude, outcome_reason, MonitorSession, SessionFault, StopReason,
};
use crate::pipeline::session_summary::{DetectionRecord, SessionMode, SessionSummary};
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::source_error::SourceError;
use crate::video::domain::video_reader::VideoReader;

/// Single-image check: read → detect → aggregate → record → render → write.
pub struct MonitorImageUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    detector: Box<dyn ObjectDetector>,
    renderer: Box<dyn OverlayRenderer>,
    aggregator: FrameAggregator,
    confidence_threshold: f32,
    logger: Box<dyn PipelineLogger>,
}

impl MonitorImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        detector: Box<dyn ObjectDetector>,
        renderer: Box<dyn OverlayRenderer>,
        aggregator: FrameAggregator,
        confidence_threshold: f32,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            image_writer,
            detector,
            renderer,
            aggregator,
            confidence_threshold,
            logger,
        }
    }

    /// Analyses `input_path` and writes `result_<timestamp>.jpg` into
    /// `output_dir`.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_dir: &Path,
    ) -> Result<SessionSummary, MonitorError> {
        self.reader.open(input_path)?;
        let first = self.reader.frames().next();
        self.reader.close();

        let mut frame = match first {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(SourceError::unrecognized(input_path.display(), e).into()),
            None => {
                return Err(SourceError::unrecognized(input_path.display(), "no frames").into())
            }
        };
        self.logger.info(&format!(
            "Analysing {} ({}x{})",
            input_path.display(),
            frame.width(),
            frame.height()
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
            ArtifactKind::ImageResult,
            chrono::Local::now().naive_local(),
        );

        let mut records = Vec::new();
        let outcome = session
            .process(&mut frame, self.logger.as_mut())
            .and_then(|report| {
                records = report
                    .detections
                    .iter()
                    .zip(&report.analysis.categories)
                    .map(|(d, category)| DetectionRecord {
                        label: d.label.clone(),
                        category: *category,
                        confidence: d.confidence,
                    })
                    .collect();
                self.image_writer
                    .write(&output, &frame)
                    .map_err(|error| SessionFault::Write {
                        target: output.display().to_string(),
                        error,
                    })
            })
            .map(|()| StopReason::Completed);

        let mut summary = session.finish(SessionMode::Image, outcome_reason(&outcome));
        summary.detections = records;
        if outcome.is_ok() {
            self.logger.info(&format!("Result saved: {}", output.display()));
            summary.output = Some(output);
        }
        conclude(outcome, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::domain::compliance_category::ComplianceCategory;
    use crate::compliance::domain::frame_aggregator::FrameAnalysis;
    use crate::detection::domain::detection::Detection;
    use crate::overlay::domain::overlay_content::OverlayContent;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubImageReader {
        frame: Option<Frame>,
        open_error: Option<fn() -> SourceError>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubImageReader {
        fn new(frame: Frame) -> Self {
            Self {
                frame: Some(frame),
                open_error: None,
                closed: Arc::new(Mutex::new(false)),
            }
        }

        fn failing(open_error: fn() -> SourceError) -> Self {
            Self {
                frame: None,
                open_error: Some(open_error),
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubImageReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
            if let Some(err) = self.open_error {
                return Err(err());
            }
            let frame = self.frame.as_ref().unwrap();
            Ok(VideoMetadata::image(
                frame.width(),
                frame.height(),
                Some(path.to_path_buf()),
            ))
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frame.take().into_iter().map(Ok))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    type Written = Arc<Mutex<Vec<(PathBuf, Frame)>>>;

    struct StubImageWriter {
        written: Written,
        fail: bool,
    }

    impl StubImageWriter {
        fn new(fail: bool) -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                fail,
            }
        }
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail {
                return Err("read-only filesystem".into());
            }
            self.written
                .lock()
                .unwrap()
                .push((path.to_path_buf(), frame.clone()));
            Ok(())
        }
    }

    struct StubDetector {
        detections: Vec<Detection>,
    }

    impl ObjectDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
            _confidence_threshold: f32,
        ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            Ok(self.detections.clone())
        }
    }

    struct MarkingRenderer;

    impl OverlayRenderer for MarkingRenderer {
        fn render(
            &self,
            frame: &mut Frame,
            _detections: &[Detection],
            _analysis: &FrameAnalysis,
            content: &OverlayContent,
        ) -> Result<(), Box<dyn std::error::Error>> {
            frame.data_mut()[0] = if content.is_violation() { 255 } else { 1 };
            Ok(())
        }
    }

    // --- Helpers ---

    fn make_frame() -> Frame {
        Frame::new(vec![0; 16 * 16 * 3], 16, 16, 3, 0)
    }

    fn det(label: &str, confidence: f32) -> Detection {
        Detection::new(label, confidence, BoundingBox::new(1.0, 1.0, 8.0, 8.0))
    }

    fn use_case(reader: StubImageReader, writer: StubImageWriter, detections: Vec<Detection>) -> MonitorImageUseCase {
        MonitorImageUseCase::new(
            Box::new(reader),
            Box::new(writer),
            Box::new(StubDetector { detections }),
            Box::new(MarkingRenderer),
            FrameAggregator::default(),
            0.5,
            Box::new(NullPipelineLogger),
        )
    }

    // --- Tests ---

    #[test]
    fn test_writes_annotated_result_and_summarises() {
        let reader = StubImageReader::new(make_frame());
        let closed = reader.closed.clone();
        let writer = StubImageWriter::new(false);
        let written = writer.written.clone();
        let mut uc = use_case(
            reader,
            writer,
            vec![det("NO-Hardhat", 0.9), det("Person", 0.95), det("Safety Vest", 0.8)],
        );

        let summary = uc
            .execute(Path::new("site.jpg"), Path::new("out"))
            .unwrap();

        assert_eq!(summary.mode, SessionMode::Image);
        assert_eq!(summary.stop_reason, StopReason::Completed);
        assert_eq!(summary.frames_processed, 1);
        assert_eq!(summary.violation_frames, 1);
        assert_eq!(summary.total(ComplianceCategory::NoHardhat), 1);
        assert_eq!(summary.detections.len(), 3);
        assert_eq!(summary.detections[0].category, ComplianceCategory::NoHardhat);
        assert!(*closed.lock().unwrap());

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        let (path, frame) = &written[0];
        assert_eq!(summary.output.as_ref(), Some(path));
        assert!(path.starts_with("out"));
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("result_") && name.ends_with(".jpg"));
        assert_eq!(frame.data()[0], 255);
    }

    #[test]
    fn test_compliant_image() {
        let mut uc = use_case(
            StubImageReader::new(make_frame()),
            StubImageWriter::new(false),
            vec![det("Hardhat", 0.9), det("Mask", 0.8), det("Safety Vest", 0.7), det("Person", 0.9)],
        );
        let summary = uc.execute(Path::new("site.png"), Path::new("out")).unwrap();
        assert_eq!(summary.violation_frames, 0);
        assert_eq!(summary.compliance_rate, 100.0);
    }

    #[test]
    fn test_missing_image_is_source_unavailable() {
        let mut uc = use_case(
            StubImageReader::failing(|| SourceError::unavailable("gone.jpg", "not found")),
            StubImageWriter::new(false),
            vec![],
        );
        let err = uc.execute(Path::new("gone.jpg"), Path::new("out")).unwrap_err();
        assert!(matches!(err, MonitorError::SourceUnavailable(_)));
        assert!(err.summary().is_none());
    }

    #[test]
    fn test_undecodable_image_is_unrecognized_input() {
        let mut uc = use_case(
            StubImageReader::failing(|| SourceError::unrecognized("notes.jpg", "bad header")),
            StubImageWriter::new(false),
            vec![],
        );
        let err = uc.execute(Path::new("notes.jpg"), Path::new("out")).unwrap_err();
        assert!(matches!(err, MonitorError::UnrecognizedInput(_)));
    }

    #[test]
    fn test_write_failure_reports_sink_failure_with_summary() {
        let mut uc = use_case(
            StubImageReader::new(make_frame()),
            StubImageWriter::new(true),
            vec![det("NO-Mask", 0.9)],
        );
        let err = uc.execute(Path::new("site.jpg"), Path::new("out")).unwrap_err();

        assert!(matches!(err, MonitorError::SinkFailure { .. }));
        let summary = err.summary().unwrap();
        assert_eq!(summary.stop_reason, StopReason::SinkFailure);
        assert_eq!(summary.frames_processed, 1);
        assert_eq!(summary.violation_frames, 1);
        assert!(summary.output.is_none());
    }
}
