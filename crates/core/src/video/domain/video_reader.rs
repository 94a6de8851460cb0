use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::source_error::SourceError;

/// Reads frames from an image, a video file, a network stream or a camera.
///
/// Implementations handle I/O details (device, codec, container) while the
/// controllers work with the abstract `Frame` and `VideoMetadata` types.
pub trait VideoReader: Send {
    /// Opens the source and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError>;

    /// Returns an iterator over frames in decode order.
    ///
    /// `None` means end of stream; an `Err` item is a mid-stream read failure.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the reader. Safe to call repeatedly.
    fn close(&mut self);
}
