use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::source_error::SourceError;
use crate::video::domain::video_reader::VideoReader;

/// Adapts a single image file to the [`VideoReader`] interface.
///
/// The image is a one-frame video with `fps = 0` and `total_frames = 1`.
/// Decoding uses the `image` crate, which sniffs the format from the file
/// contents rather than trusting the extension.
pub struct ImageFileReader {
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
        let location = path.display();

        let reader = image::ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| SourceError::unavailable(&location, e))?;

        let image = reader.decode().map_err(|e| match e {
            image::ImageError::IoError(io) => SourceError::unavailable(&location, io),
            other => SourceError::unrecognized(&location, other),
        })?;

        let frame = Frame::from_rgb_image(image.to_rgb8(), 0);
        let metadata =
            VideoMetadata::image(frame.width(), frame.height(), Some(path.to_path_buf()));
        self.frame = Some(frame);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err("ImageFileReader: not opened".into())));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_returns_single_frame_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "site.png", 100, 80);

        let mut reader = ImageFileReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (100, 80));
        assert_eq!(meta.fps, 0.0);
        assert_eq!(meta.total_frames, 1);
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let mut reader = ImageFileReader::new();
        let err = reader.open(Path::new("/nonexistent/site.jpg")).unwrap_err();
        assert!(matches!(err, SourceError::Unavailable { .. }));
    }

    #[test]
    fn test_non_image_content_is_unrecognized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, b"shift roster, not a picture").unwrap();

        let mut reader = ImageFileReader::new();
        let err = reader.open(&path).unwrap_err();
        assert!(matches!(err, SourceError::Unrecognized { .. }));
    }

    #[test]
    fn test_frames_yields_single_rgb_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "site.png", 100, 80);
        let mut reader = ImageFileReader::new();
        reader.open(&path).unwrap();

        let frames: Vec<_> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.index(), 0);
        assert_eq!(frame.channels(), 3);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut reader = ImageFileReader::new();
        assert!(reader.frames().next().unwrap().is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "site.bmp", 10, 10);
        let mut reader = ImageFileReader::new();
        reader.open(&path).unwrap();
        reader.close();
        reader.close();
    }
}
