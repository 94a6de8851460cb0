use std::path::{Path, PathBuf};
use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::compliance::domain::frame_aggregator::FrameAggregator;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::pipeline::artifact_paths::{artifact_path, unique_artifact_path, ArtifactKind};
use crate::pipeline::live_command::LiveCommand;
use crate::pipeline::monitor_error::MonitorError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::session_controller::{
    conclude, outcome_reason, MonitorSession, SessionFault, SessionOutcome, StopReason,
};
use crate::pipeline::session_summary::{SessionMode, SessionSummary};
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

/// Unbounded live stream (camera or network source).
///
/// Runs until the source ends, a read fails, or a [`LiveCommand::Quit`]
/// arrives. Commands are polled once per frame, after the overlay is drawn.
/// Snapshots go to `snapshot_<timestamp>.jpg`; with a recorder attached the
/// annotated stream is also written to `recording_<timestamp>.mp4`.
pub struct MonitorLiveUseCase {
    reader: Box<dyn VideoReader>,
    snapshot_writer: Box<dyn ImageWriter>,
    recorder: Option<Box<dyn VideoWriter>>,
    detector: Box<dyn ObjectDetector>,
    renderer: Box<dyn OverlayRenderer>,
    aggregator: FrameAggregator,
    confidence_threshold: f32,
    logger: Box<dyn PipelineLogger>,
    commands: Receiver<LiveCommand>,
}

impl MonitorLiveUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        snapshot_writer: Box<dyn ImageWriter>,
        detector: Box<dyn ObjectDetector>,
        renderer: Box<dyn OverlayRenderer>,
        aggregator: FrameAggregator,
        confidence_threshold: f32,
        logger: Box<dyn PipelineLogger>,
        commands: Receiver<LiveCommand>,
    ) -> Self {
        Self {
            reader,
            snapshot_writer,
            recorder: None,
            detector,
            renderer,
            aggregator,
            confidence_threshold,
            logger,
            commands,
        }
    }

    /// Also write the annotated stream through `recorder`.
    pub fn with_recorder(mut self, recorder: Box<dyn VideoWriter>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn execute(
        &mut self,
        source: &Path,
        output_dir: &Path,
    ) -> Result<SessionSummary, MonitorError> {
        let metadata = self.reader.open(source)?;
        self.logger.info(&format!(
            "Monitoring {} ({}x{}); enter 's' for a snapshot, 'q' to quit",
            source.display(),
            metadata.width,
            metadata.height
        ));

        let mut session = MonitorSession::new(
            self.detector.as_mut(),
            self.renderer.as_ref(),
            &self.aggregator,
            self.confidence_threshold,
        );
        session.start();

        let mut snapshots = Vec::new();
        let mut recording = None;

        let opened = match self.recorder.as_mut() {
            Some(recorder) => {
                let path = artifact_path(
                    output_dir,
                    ArtifactKind::Recording,
                    chrono::Local::now().naive_local(),
                );
                let target = path.display().to_string();
                let opened = recorder
                    .open(&path, &metadata)
                    .map_err(|error| SessionFault::Write { target, error });
                recording = Some(path);
                opened
            }
            None => Ok(()),
        };

        let recording_target = recording
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let mut outcome = match opened {
            Ok(()) => LiveLoop {
                session: &mut session,
                logger: self.logger.as_mut(),
                commands: &self.commands,
                snapshot_writer: self.snapshot_writer.as_ref(),
                recorder: &mut self.recorder,
                recording_target: recording_target.clone(),
                output_dir,
                snapshots: &mut snapshots,
            }
            .run(self.reader.as_mut()),
            Err(fault) => Err(fault),
        };

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(error) = recorder.close() {
                if outcome.is_ok() {
                    outcome = Err(SessionFault::Write {
                        target: recording_target,
                        error,
                    });
                } else {
                    log::warn!("Closing {recording_target} failed: {error}");
                }
            }
        }
        self.reader.close();

        if let Err(fault) = &outcome {
            log::error!("{fault}");
        }

        let mut summary = session.finish(SessionMode::Live, outcome_reason(&outcome));
        summary.snapshots = snapshots;
        if outcome.is_ok() {
            summary.output = recording;
        }
        self.logger.summary();
        conclude(outcome, summary)
    }
}

/// Per-session loop state, borrowed from the use case for one run.
struct LiveLoop<'s, 'a> {
    session: &'s mut MonitorSession<'a>,
    logger: &'s mut dyn PipelineLogger,
    commands: &'s Receiver<LiveCommand>,
    snapshot_writer: &'s dyn ImageWriter,
    recorder: &'s mut Option<Box<dyn VideoWriter>>,
    recording_target: String,
    output_dir: &'s Path,
    snapshots: &'s mut Vec<PathBuf>,
}

impl LiveLoop<'_, '_> {
    fn run(&mut self, reader: &mut dyn VideoReader) -> SessionOutcome {
        for (i, item) in reader.frames().enumerate() {
            let mut frame = match item {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Live source read failed after {i} frames: {e}");
                    return Ok(StopReason::ReadFailure);
                }
            };

            self.session.process(&mut frame, &mut *self.logger)?;

            if let Some(recorder) = self.recorder.as_mut() {
                let t0 = Instant::now();
                recorder.write(&frame).map_err(|error| SessionFault::Write {
                    target: self.recording_target.clone(),
                    error,
                })?;
                self.logger
                    .timing("write", t0.elapsed().as_secs_f64() * 1000.0);
            }
            self.logger.progress(i + 1, 0);

            if self.poll_commands(&frame) {
                return Ok(StopReason::UserRequested);
            }
        }
        Ok(StopReason::EndOfStream)
    }

    /// Handles every pending command; returns `true` when quit was requested.
    fn poll_commands(&mut self, frame: &Frame) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(LiveCommand::Snapshot) => self.save_snapshot(frame),
                Ok(LiveCommand::Quit) => {
                    self.logger.info("Quit requested");
                    return true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Snapshot failures are logged and otherwise ignored.
    fn save_snapshot(&mut self, frame: &Frame) {
        let path = unique_artifact_path(
            self.output_dir,
            ArtifactKind::Snapshot,
            chrono::Local::now().naive_local(),
        );
        match self.snapshot_writer.write(&path, frame) {
            Ok(()) => {
                self.logger
                    .info(&format!("Snapshot saved: {}", path.display()));
                self.snapshots.push(path);
            }
            Err(e) => log::warn!("Snapshot {} failed: {e}", path.display()),
        }
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
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::source_error::SourceError;
    use crossbeam_channel::{unbounded, Sender};
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Camera stand-in: `frames` good frames, then a read error or the end.
    struct StubCamera {
        remaining: usize,
        produced: usize,
        fail_at_end: bool,
        closed: Arc<Mutex<bool>>,
    }

    impl StubCamera {
        fn new(frames: usize, fail_at_end: bool) -> Self {
            Self {
                remaining: frames,
                produced: 0,
                fail_at_end,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubCamera {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
            Ok(VideoMetadata {
                width: 8,
                height: 8,
                fps: 0.0,
                total_frames: 0,
                codec: "rawvideo".into(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(std::iter::from_fn(move || {
                if self.remaining == 0 {
                    if self.fail_at_end {
                        self.fail_at_end = false;
                        return Some(Err("device disconnected".into()));
                    }
                    return None;
                }
                self.remaining -= 1;
                self.produced += 1;
                Some(Ok(Frame::new(vec![0; 8 * 8 * 3], 8, 8, 3, self.produced - 1)))
            }))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    /// Sends `command` while processing call number `at` (0-based).
    struct CommandingDetector {
        calls: usize,
        script: Vec<(usize, LiveCommand)>,
        tx: Sender<LiveCommand>,
        detections: Vec<Detection>,
    }

    impl ObjectDetector for CommandingDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
            _confidence_threshold: f32,
        ) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
            for (at, command) in &self.script {
                if *at == self.calls {
                    self.tx.send(*command).unwrap();
                }
            }
            self.calls += 1;
            Ok(self.detections.clone())
        }
    }

    struct NoopRenderer;

    impl OverlayRenderer for NoopRenderer {
        fn render(
            &self,
            _frame: &mut Frame,
            _detections: &[Detection],
            _analysis: &FrameAnalysis,
            _content: &OverlayContent,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }
    }

    struct StubImageWriter {
        written: Arc<Mutex<Vec<PathBuf>>>,
        fail: bool,
    }

    impl ImageWriter for StubImageWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail {
                return Err("no space left".into());
            }
            self.written.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    struct StubRecorder {
        frames: Arc<Mutex<usize>>,
        closed: Arc<Mutex<bool>>,
        fail_write: bool,
    }

    impl VideoWriter for StubRecorder {
        fn open(
            &mut self,
            _path: &Path,
            _metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn write(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            if self.fail_write {
                return Err("encoder gone".into());
            }
            *self.frames.lock().unwrap() += 1;
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    // --- Helpers ---

    struct Harness {
        use_case: MonitorLiveUseCase,
        snapshots: Arc<Mutex<Vec<PathBuf>>>,
        camera_closed: Arc<Mutex<bool>>,
    }

    fn harness(
        camera: StubCamera,
        script: Vec<(usize, LiveCommand)>,
        detections: Vec<Detection>,
        snapshot_fails: bool,
    ) -> Harness {
        let (tx, rx) = unbounded();
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let camera_closed = camera.closed.clone();
        let use_case = MonitorLiveUseCase::new(
            Box::new(camera),
            Box::new(StubImageWriter {
                written: snapshots.clone(),
                fail: snapshot_fails,
            }),
            Box::new(CommandingDetector {
                calls: 0,
                script,
                tx,
                detections,
            }),
            Box::new(NoopRenderer),
            FrameAggregator::default(),
            0.5,
            Box::new(NullPipelineLogger),
            rx,
        );
        Harness {
            use_case,
            snapshots,
            camera_closed,
        }
    }

    fn det(label: &str) -> Detection {
        Detection::new(label, 0.9, BoundingBox::new(0.0, 0.0, 4.0, 4.0))
    }

    // --- Tests ---

    #[test]
    fn test_quit_stops_after_current_frame() {
        let mut h = harness(
            StubCamera::new(100, false),
            vec![(2, LiveCommand::Quit)],
            vec![det("Person")],
            false,
        );
        let dir = tempfile::tempdir().unwrap();

        let summary = h.use_case.execute(Path::new("/dev/video0"), dir.path()).unwrap();

        assert_eq!(summary.mode, SessionMode::Live);
        assert_eq!(summary.stop_reason, StopReason::UserRequested);
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(summary.total(ComplianceCategory::Person), 3);
        assert!(*h.camera_closed.lock().unwrap());
    }

    #[test]
    fn test_read_failure_is_graceful_stop() {
        let mut h = harness(StubCamera::new(4, true), vec![], vec![det("NO-Hardhat")], false);
        let dir = tempfile::tempdir().unwrap();

        let summary = h.use_case.execute(Path::new("/dev/video0"), dir.path()).unwrap();

        assert_eq!(summary.stop_reason, StopReason::ReadFailure);
        assert_eq!(summary.frames_processed, 4);
        assert_eq!(summary.violation_frames, 4);
        assert_eq!(summary.compliance_rate, 0.0);
        assert!(*h.camera_closed.lock().unwrap());
    }

    #[test]
    fn test_stream_end_is_end_of_stream() {
        let mut h = harness(StubCamera::new(2, false), vec![], vec![], false);
        let dir = tempfile::tempdir().unwrap();

        let summary = h.use_case.execute(Path::new("rtsp://cam/1"), dir.path()).unwrap();

        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(summary.frames_processed, 2);
    }

    #[test]
    fn test_snapshot_does_not_alter_session() {
        let mut h = harness(
            StubCamera::new(5, false),
            vec![(1, LiveCommand::Snapshot), (3, LiveCommand::Snapshot)],
            vec![det("Hardhat")],
            false,
        );
        let dir = tempfile::tempdir().unwrap();

        let summary = h.use_case.execute(Path::new("/dev/video0"), dir.path()).unwrap();

        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(summary.frames_processed, 5);
        let written = h.snapshots.lock().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(summary.snapshots, *written);
        for path in written.iter() {
            assert!(path.starts_with(dir.path()));
            let name = path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("snapshot_") && name.ends_with(".jpg"));
        }
    }

    #[test]
    fn test_snapshot_failure_is_not_fatal() {
        let mut h = harness(
            StubCamera::new(3, false),
            vec![(0, LiveCommand::Snapshot)],
            vec![],
            true,
        );
        let dir = tempfile::tempdir().unwrap();

        let summary = h.use_case.execute(Path::new("/dev/video0"), dir.path()).unwrap();

        assert_eq!(summary.frames_processed, 3);
        assert!(summary.snapshots.is_empty());
    }

    #[test]
    fn test_snapshot_then_quit_in_same_poll() {
        let mut h = harness(
            StubCamera::new(10, false),
            vec![(0, LiveCommand::Snapshot), (0, LiveCommand::Quit)],
            vec![],
            false,
        );
        let dir = tempfile::tempdir().unwrap();

        let summary = h.use_case.execute(Path::new("/dev/video0"), dir.path()).unwrap();

        assert_eq!(summary.frames_processed, 1);
        assert_eq!(summary.snapshots.len(), 1);
        assert_eq!(summary.stop_reason, StopReason::UserRequested);
    }

    #[test]
    fn test_recorder_receives_every_frame() {
        let frames = Arc::new(Mutex::new(0));
        let closed = Arc::new(Mutex::new(false));
        let h = harness(StubCamera::new(4, false), vec![], vec![], false);
        let dir = tempfile::tempdir().unwrap();
        let mut uc = h.use_case.with_recorder(Box::new(StubRecorder {
            frames: frames.clone(),
            closed: closed.clone(),
            fail_write: false,
        }));

        let summary = uc.execute(Path::new("/dev/video0"), dir.path()).unwrap();

        assert_eq!(*frames.lock().unwrap(), 4);
        assert!(*closed.lock().unwrap());
        let output = summary.output.unwrap();
        let name = output.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("recording_") && name.ends_with(".mp4"));
    }

    #[test]
    fn test_recorder_write_failure_is_sink_failure() {
        let closed = Arc::new(Mutex::new(false));
        let h = harness(StubCamera::new(4, false), vec![], vec![det("NO-Mask")], false);
        let camera_closed = h.camera_closed.clone();
        let dir = tempfile::tempdir().unwrap();
        let mut uc = h.use_case.with_recorder(Box::new(StubRecorder {
            frames: Arc::new(Mutex::new(0)),
            closed: closed.clone(),
            fail_write: true,
        }));

        let err = uc.execute(Path::new("/dev/video0"), dir.path()).unwrap_err();

        assert!(matches!(err, MonitorError::SinkFailure { .. }));
        let summary = err.summary().unwrap();
        assert_eq!(summary.frames_processed, 1);
        assert_eq!(summary.violation_frames, 1);
        assert!(*closed.lock().unwrap());
        assert!(*camera_closed.lock().unwrap());
    }

    #[test]
    fn test_sessions_do_not_share_counters() {
        let mut h = harness(StubCamera::new(2, false), vec![], vec![det("Person")], false);
        let dir = tempfile::tempdir().unwrap();

        let first = h.use_case.execute(Path::new("/dev/video0"), dir.path()).unwrap();
        // The stub camera is exhausted, so the second session sees no frames.
        let second = h.use_case.execute(Path::new("/dev/video0"), dir.path()).unwrap();

        assert_eq!(first.frames_processed, 2);
        assert_eq!(second.frames_processed, 0);
        assert_eq!(second.total(ComplianceCategory::Person), 0);
    }
}
