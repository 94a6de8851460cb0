pub mod image_writer;
pub mod source_error;
pub mod video_reader;
pub mod video_writer;
