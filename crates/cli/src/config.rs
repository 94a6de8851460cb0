use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use ppe_monitor_core::shared::constants::{
    DEFAULT_CLASS_NAMES, DEFAULT_CONFIDENCE, DEFAULT_IOU_THRESHOLD, DEFAULT_MODEL_PATH,
    DEFAULT_OUTPUT_DIR, PROGRESS_INTERVAL,
};

/// Monitor settings read from `config.json`.
///
/// Every field is optional in the file; missing fields take the built-in
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub model_path: PathBuf,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub output_dir: PathBuf,
    pub progress_interval: usize,
    pub class_names: Vec<String>,
    pub camera_device: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            confidence_threshold: DEFAULT_CONFIDENCE,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            progress_interval: PROGRESS_INTERVAL,
            class_names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
            camera_device: default_camera_device().to_string(),
        }
    }
}

fn default_camera_device() -> &'static str {
    if cfg!(target_os = "macos") {
        "0"
    } else if cfg!(target_os = "windows") {
        "video=Integrated Camera"
    } else {
        "/dev/video0"
    }
}

impl MonitorConfig {
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("PpeMonitor").join("config.json"))
    }

    /// An explicit file must exist and parse. Otherwise the user config is
    /// used when present, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::user_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path).or_else(|e| {
                log::warn!("Ignoring {}: {e}", path.display());
                Ok(Self::default())
            }),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            )
            .into());
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(format!(
                "IoU threshold must be between 0.0 and 1.0, got {}",
                self.iou_threshold
            )
            .into());
        }
        if self.progress_interval == 0 {
            return Err("Progress interval must be at least 1 frame".into());
        }
        if self.class_names.is_empty() {
            return Err("Class list must not be empty".into());
        }
        Ok(())
    }
}
