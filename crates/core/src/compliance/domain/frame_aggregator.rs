use crate::detection::domain::detection::Detection;

use super::compliance_category::ComplianceCategory;
use super::frame_tally::FrameTally;
use super::label_classifier::LabelClassifier;
use super::violation_event::ViolationEvent;

/// Classification result for one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameAnalysis {
    pub tally: FrameTally,
    pub violations: Vec<ViolationEvent>,
    /// Category of each input detection, in input order.
    pub categories: Vec<ComplianceCategory>,
}

impl FrameAnalysis {
    pub fn has_violation(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// Turns one frame's detections into a tally and its violation events.
///
/// Holds no per-frame state; session counters are updated by the caller
/// through `SessionStats::record_frame`.
#[derive(Clone, Debug, Default)]
pub struct FrameAggregator {
    classifier: LabelClassifier,
}

impl FrameAggregator {
    pub fn new(classifier: LabelClassifier) -> Self {
        Self { classifier }
    }

    pub fn aggregate(&self, detections: &[Detection]) -> FrameAnalysis {
        let mut analysis = FrameAnalysis::default();
        for detection in detections {
            let category = self.classifier.classify(&detection.label);
            analysis.tally.increment(category);
            analysis.categories.push(category);
            if let Some(event) = ViolationEvent::new(category, detection.confidence) {
                analysis.violations.push(event);
            }
        }
        analysis
    }
}
