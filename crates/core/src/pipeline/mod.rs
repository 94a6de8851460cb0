pub mod artifact_paths;
pub mod live_command;
pub mod monitor_error;
pub mod monitor_image_use_case;
pub mod monitor_live_use_case;
pub mod monitor_video_use_case;
pub mod pipeline_logger;
pub mod session_controller;
pub mod session_summary;
