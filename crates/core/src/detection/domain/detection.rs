use crate::shared::bounding_box::BoundingBox;

/// One labeled, scored object reported by the detector for a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub label: String,
    /// Score in `[0, 1]`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            label: label.into(),
            confidence,
            bbox,
        }
    }
}
