/// Class vocabulary of the bundled PPE model, in class-id order.
pub const DEFAULT_CLASS_NAMES: &[&str] = &[
    "Hardhat",
    "Mask",
    "NO-Hardhat",
    "NO-Mask",
    "NO-Safety Vest",
    "Person",
    "Safety Cone",
    "Safety Vest",
    "machinery",
    "vehicle",
];

pub const DEFAULT_MODEL_PATH: &str = "models/ppe_detection/best.onnx";

pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// IoU above which lower-scoring boxes of the same class are suppressed.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

pub const DEFAULT_OUTPUT_DIR: &str = "outputs/safety_monitoring";

/// Frames between progress reports for video processing.
pub const PROGRESS_INTERVAL: usize = 30;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];
