use chrono::NaiveDateTime;

use crate::compliance::domain::compliance_category::ComplianceCategory;
use crate::compliance::domain::frame_tally::FrameTally;
use crate::compliance::domain::violation_event::ViolationEvent;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const COMPLIANT_MESSAGE: &str = "All workers compliant with safety requirements";

/// Binary frame status; renderers must draw the two states distinguishably.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComplianceStatus {
    Compliant,
    Violation,
}

/// Everything an overlay has to show for one frame, as text.
///
/// Built from the frame's tally and violations only, so it can be checked
/// without drawing anything.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayContent {
    pub status: ComplianceStatus,
    pub status_line: String,
    pub counts_line: String,
    /// Violation breakdown, or the all-compliant message.
    pub violations_line: String,
    pub secondary_line: String,
    pub timestamp: String,
}

impl OverlayContent {
    pub fn build(
        tally: &FrameTally,
        violations: &[ViolationEvent],
        timestamp: NaiveDateTime,
    ) -> Self {
        use ComplianceCategory::*;

        let status = if violations.is_empty() {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::Violation
        };

        let status_line = match status {
            ComplianceStatus::Violation => "VIOLATION DETECTED",
            ComplianceStatus::Compliant => "SAFETY COMPLIANT",
        }
        .to_string();

        let counts_line = format!(
            "Workers: {} | Hardhats: {} | Masks: {} | Vests: {}",
            tally.get(Person),
            tally.get(Hardhat),
            tally.get(Mask),
            tally.get(SafetyVest),
        );

        let violations_line = match status {
            ComplianceStatus::Violation => format!(
                "Violations: No-Hat({}) | No-Mask({}) | No-Vest({})",
                tally.get(NoHardhat),
                tally.get(NoMask),
                tally.get(NoVest),
            ),
            ComplianceStatus::Compliant => COMPLIANT_MESSAGE.to_string(),
        };

        let secondary_line = format!(
            "Cones: {} | Machinery: {} | Vehicles: {}",
            tally.get(SafetyCone),
            tally.get(Machinery),
            tally.get(Vehicle),
        );

        Self {
            status,
            status_line,
            counts_line,
            violations_line,
            secondary_line,
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn is_violation(&self) -> bool {
        self.status == ComplianceStatus::Violation
    }
}
