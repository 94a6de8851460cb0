use image::RgbImage;
use ndarray::ArrayView3;

/// One decoded image or video frame: tightly packed RGB24 bytes, row-major.
///
/// Pixel-format conversion happens in the readers and writers; everything
/// between them (detector, overlay) sees RGB.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Wraps a decoded `image` buffer as frame `index`.
    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, 3, index)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels into an `RgbImage` for drawing.
    ///
    /// Returns `None` for frames that are not 3-channel.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.channels != 3 {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Replaces the pixel data with `image`, which must have the frame's size.
    pub fn copy_from_rgb_image(&mut self, image: &RgbImage) -> Result<(), String> {
        if image.dimensions() != (self.width, self.height) || self.channels != 3 {
            return Err(format!(
                "image {}x{} does not match frame {}x{}x{}",
                image.width(),
                image.height(),
                self.width,
                self.height,
                self.channels
            ));
        }
        self.data.copy_from_slice(image.as_raw());
        Ok(())
    }
}
