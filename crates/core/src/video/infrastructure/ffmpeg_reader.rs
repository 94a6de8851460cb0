use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::source_error::SourceError;
use crate::video::domain::video_reader::VideoReader;

/// Decodes frames via ffmpeg-next (libavformat + libavcodec).
///
/// Handles video files and network streams (`rtsp://`, `http://`) directly.
/// [`FfmpegReader::camera`] opens local capture devices through the
/// platform's libavdevice input format instead. Each decoded frame is
/// converted to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegReader {
    device_format: Option<&'static str>,
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    video_stream_index: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    /// Reader for files and stream URLs.
    pub fn new() -> Self {
        Self {
            device_format: None,
            input_ctx: None,
            decoder: None,
            scaler: None,
            video_stream_index: 0,
        }
    }

    /// Reader for a local camera.
    ///
    /// The path passed to `open` is the device name as the platform input
    /// format expects it: `/dev/video0` for v4l2, `0` for avfoundation,
    /// `video=<name>` for dshow.
    pub fn camera() -> Self {
        Self {
            device_format: Some(camera_input_format()),
            ..Self::new()
        }
    }

    fn open_input(
        &self,
        path: &Path,
    ) -> Result<ffmpeg_next::format::context::Input, SourceError> {
        let location = path.display();
        let Some(format_name) = self.device_format else {
            return ffmpeg_next::format::input(&path)
                .map_err(|e| SourceError::unavailable(&location, e));
        };

        ffmpeg_next::device::register_all();
        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == format_name)
            .ok_or_else(|| {
                SourceError::unavailable(&location, format!("no {format_name} capture support"))
            })?;

        let context = ffmpeg_next::format::open_with(
            &path,
            &ffmpeg_next::format::format::Format::Input(format),
            ffmpeg_next::Dictionary::new(),
        )
        .map_err(|e| SourceError::unavailable(&location, e))?;

        match context {
            ffmpeg_next::format::context::Context::Input(input) => Ok(input),
            ffmpeg_next::format::context::Context::Output(_) => Err(SourceError::unavailable(
                &location,
                "device opened as an output",
            )),
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

fn camera_input_format() -> &'static str {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
        let location = path.display();
        ffmpeg_next::init().map_err(|e| SourceError::unavailable(&location, e))?;

        let ictx = self.open_input(path)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| SourceError::unrecognized(&location, "no video stream found"))?;

        let video_stream_index = stream.index();
        let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .and_then(|ctx| ctx.decoder().video())
            .map_err(|e| SourceError::unrecognized(&location, e))?;

        let rate = stream.avg_frame_rate();
        let rate = if rate.denominator() != 0 && rate.numerator() != 0 {
            rate
        } else {
            stream.rate()
        };
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .map_err(|e| SourceError::unrecognized(&location, e))?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            total_frames: stream.frames().max(0) as usize,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source_path: Some(path.to_path_buf()),
        };

        log::debug!(
            "Opened {location}: {width}x{height} @ {fps:.2} fps, {} frames",
            metadata.total_frames
        );

        self.video_stream_index = video_stream_index;
        self.decoder = Some(decoder);
        self.scaler = Some(scaler);
        self.input_ctx = Some(ictx);

        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let (Some(ictx), Some(decoder), Some(scaler)) = (
            self.input_ctx.as_mut(),
            self.decoder.as_mut(),
            self.scaler.as_mut(),
        ) else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        let width = decoder.width();
        let height = decoder.height();

        Box::new(FfmpegFrameIter {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index: self.video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.scaler = None;
        self.decoder = None;
        self.input_ctx = None;
    }
}

/// Lazy iterator that decodes one frame per `next`, so long recordings and
/// unbounded camera streams are never buffered.
struct FfmpegFrameIter<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: &'a mut ffmpeg_next::decoder::Video,
    scaler: &'a mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn try_receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb_frame) {
            self.done = true;
            return Some(Err(Box::new(e)));
        }

        let pixels = extract_rgb_pixels(&rgb_frame, self.width, self.height);
        let frame = Frame::new(pixels, self.width, self.height, 3, self.frame_index);
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        let mut retries = 0;
        loop {
            let mut packet = ffmpeg_next::Packet::empty();
            match classify_read(packet.read(self.ictx), retries) {
                PacketRead::Ready => retries = 0,
                PacketRead::Retry => {
                    retries += 1;
                    std::thread::sleep(READ_RETRY_DELAY);
                    continue;
                }
                PacketRead::EndOfStream => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                    if let Some(result) = self.try_receive() {
                        return Some(result);
                    }
                    self.done = true;
                    return None;
                }
                PacketRead::Failed(e) => {
                    self.done = true;
                    return Some(Err(Box::new(e)));
                }
            }

            if packet.stream() != self.video_stream_index {
                continue;
            }

            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Consecutive `EAGAIN` reads tolerated before a device counts as failed.
const MAX_READ_RETRIES: u32 = 100;

const READ_RETRY_DELAY: std::time::Duration = std::time::Duration::from_millis(10);

/// Outcome of one `av_read_frame` call.
#[derive(Debug)]
enum PacketRead {
    Ready,
    Retry,
    EndOfStream,
    Failed(ffmpeg_next::Error),
}

/// Only end of file finishes the stream; any other error (a camera that
/// went away returns ENODEV or EIO on every call) fails the read.
fn classify_read(result: Result<(), ffmpeg_next::Error>, retries: u32) -> PacketRead {
    match result {
        Ok(()) => PacketRead::Ready,
        Err(ffmpeg_next::Error::Eof) => PacketRead::EndOfStream,
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::error::EAGAIN => {
            if retries < MAX_READ_RETRIES {
                PacketRead::Retry
            } else {
                PacketRead::Failed(ffmpeg_next::Error::Other { errno })
            }
        }
        Err(e) => PacketRead::Failed(e),
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping the per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
