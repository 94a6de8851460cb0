use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

/// Domain interface for the object detector.
///
/// Must be deterministic for a fixed frame and threshold, and must not
/// return detections scored below `confidence_threshold`. Takes `&mut self`
/// because inference sessions need exclusive access while running.
pub trait ObjectDetector: Send {
    fn detect(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
