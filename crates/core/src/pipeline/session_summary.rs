use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::compliance::domain::compliance_category::ComplianceCategory;
use crate::compliance::domain::session_stats::SessionStats;

use super::session_controller::StopReason;

/// Which controller produced a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    Image,
    Video,
    Live,
}

/// One detection of a single-image session, as listed in its report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionRecord {
    pub label: String,
    pub category: ComplianceCategory,
    pub confidence: f32,
}

/// Final report of a monitoring session, derived from its [`SessionStats`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
    pub mode: SessionMode,
    pub stop_reason: StopReason,
    pub frames_processed: u64,
    pub violation_frames: u64,
    pub compliance_rate: f64,
    pub totals: BTreeMap<ComplianceCategory, u64>,
    /// Annotated image or video written by the session, if any.
    pub output: Option<PathBuf>,
    pub snapshots: Vec<PathBuf>,
    /// Per-detection listing; filled for single-image sessions only.
    pub detections: Vec<DetectionRecord>,
}

impl SessionSummary {
    pub fn from_stats(mode: SessionMode, stop_reason: StopReason, stats: &SessionStats) -> Self {
        Self {
            mode,
            stop_reason,
            frames_processed: stats.frames_processed(),
            violation_frames: stats.violation_frames(),
            compliance_rate: stats.compliance_rate(),
            totals: stats.totals().collect(),
            output: None,
            snapshots: Vec::new(),
            detections: Vec::new(),
        }
    }

    pub fn total(&self, category: ComplianceCategory) -> u64 {
        self.totals.get(&category).copied().unwrap_or(0)
    }

    pub fn violation_total(&self) -> u64 {
        ComplianceCategory::VIOLATIONS
            .iter()
            .map(|c| self.total(*c))
            .sum()
    }
}

const RULE: &str =
    "======================================================================";

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ComplianceCategory::*;

        let title = match self.mode {
            SessionMode::Image => "IMAGE ANALYSIS RESULTS",
            SessionMode::Video | SessionMode::Live => "MONITORING SESSION SUMMARY",
        };
        writeln!(f, "{RULE}")?;
        writeln!(f, "{title}")?;
        writeln!(f, "{RULE}")?;

        if self.mode == SessionMode::Image {
            writeln!(f, "Detections:")?;
            if self.detections.is_empty() {
                writeln!(f, "  (none)")?;
            }
            for d in &self.detections {
                writeln!(
                    f,
                    "  - {}: {:.1}% confidence",
                    d.label.to_uppercase(),
                    d.confidence * 100.0
                )?;
            }
            writeln!(f)?;
        } else {
            writeln!(f, "Total Frames Processed: {}", self.frames_processed)?;
            writeln!(f, "Violation Frames: {}", self.violation_frames)?;
            writeln!(f, "Safety Compliance Rate: {:.2}%", self.compliance_rate)?;
            writeln!(f, "Stopped: {}", self.stop_reason)?;
            writeln!(f)?;
        }

        writeln!(f, "PPE Detections Summary:")?;
        writeln!(f, "  Hardhats: {}", self.total(Hardhat))?;
        writeln!(f, "  Masks: {}", self.total(Mask))?;
        writeln!(f, "  Safety Vests: {}", self.total(SafetyVest))?;
        writeln!(f)?;
        writeln!(f, "Violations Detected:")?;
        writeln!(f, "  No-Hardhat: {}", self.total(NoHardhat))?;
        writeln!(f, "  No-Mask: {}", self.total(NoMask))?;
        writeln!(f, "  No-Safety Vest: {}", self.total(NoVest))?;
        writeln!(f)?;
        writeln!(f, "Other Detections:")?;
        writeln!(f, "  Persons: {}", self.total(Person))?;
        writeln!(f, "  Safety Cones: {}", self.total(SafetyCone))?;
        writeln!(f, "  Machinery: {}", self.total(Machinery))?;
        writeln!(f, "  Vehicles: {}", self.total(Vehicle))?;

        if self.mode == SessionMode::Image {
            writeln!(f)?;
            if self.violation_total() > 0 {
                writeln!(f, "SAFETY VIOLATIONS DETECTED: {}", self.violation_total())?;
            } else {
                writeln!(f, "All workers compliant with safety requirements")?;
            }
        }

        if let Some(output) = &self.output {
            writeln!(f)?;
            writeln!(f, "Result saved: {}", output.display())?;
        }
        for snapshot in &self.snapshots {
            writeln!(f, "Snapshot saved: {}", snapshot.display())?;
        }
        write!(f, "{RULE}")
    }
}
