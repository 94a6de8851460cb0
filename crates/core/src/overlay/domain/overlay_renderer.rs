use crate::compliance::domain::frame_aggregator::FrameAnalysis;
use crate::detection::domain::detection::Detection;
use crate::shared::frame::Frame;

use super::overlay_content::OverlayContent;

/// Draws the compliance overlay onto a frame in place.
///
/// `analysis.categories` lines up with `detections`, so implementations can
/// style each box by its category without classifying again.
pub trait OverlayRenderer: Send {
    fn render(
        &self,
        frame: &mut Frame,
        detections: &[Detection],
        analysis: &FrameAnalysis,
        content: &OverlayContent,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
