use std::path::PathBuf;

/// Stream properties reported by a reader when it opens a source.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Frame count from the container; 0 when unknown (cameras, live streams).
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Metadata for a still image, modelled as a one-frame video with `fps = 0`.
    pub fn image(width: u32, height: u32, source_path: Option<PathBuf>) -> Self {
        Self {
            width,
            height,
            fps: 0.0,
            total_frames: 1,
            codec: String::new(),
            source_path,
        }
    }
}
