use serde::Serialize;

/// Semantic bucket a raw detector label is normalized into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ComplianceCategory {
    Hardhat,
    Mask,
    SafetyVest,
    NoHardhat,
    NoMask,
    NoVest,
    Person,
    SafetyCone,
    Machinery,
    Vehicle,
    Unclassified,
}

impl ComplianceCategory {
    pub const COUNT: usize = 11;

    pub const ALL: [ComplianceCategory; Self::COUNT] = [
        ComplianceCategory::Hardhat,
        ComplianceCategory::Mask,
        ComplianceCategory::SafetyVest,
        ComplianceCategory::NoHardhat,
        ComplianceCategory::NoMask,
        ComplianceCategory::NoVest,
        ComplianceCategory::Person,
        ComplianceCategory::SafetyCone,
        ComplianceCategory::Machinery,
        ComplianceCategory::Vehicle,
        ComplianceCategory::Unclassified,
    ];

    pub const VIOLATIONS: [ComplianceCategory; 3] = [
        ComplianceCategory::NoHardhat,
        ComplianceCategory::NoMask,
        ComplianceCategory::NoVest,
    ];

    /// True for the negated-equipment categories that make a frame non-compliant.
    pub fn is_violation(self) -> bool {
        Self::VIOLATIONS.contains(&self)
    }

    /// True for worn protective equipment.
    pub fn is_protective(self) -> bool {
        matches!(
            self,
            ComplianceCategory::Hardhat | ComplianceCategory::Mask | ComplianceCategory::SafetyVest
        )
    }

    /// Position in [`ComplianceCategory::ALL`], used for dense per-category counters.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ComplianceCategory::Hardhat => "Hardhat",
            ComplianceCategory::Mask => "Mask",
            ComplianceCategory::SafetyVest => "Safety Vest",
            ComplianceCategory::NoHardhat => "No-Hardhat",
            ComplianceCategory::NoMask => "No-Mask",
            ComplianceCategory::NoVest => "No-Safety Vest",
            ComplianceCategory::Person => "Person",
            ComplianceCategory::SafetyCone => "Safety Cone",
            ComplianceCategory::Machinery => "Machinery",
            ComplianceCategory::Vehicle => "Vehicle",
            ComplianceCategory::Unclassified => "Unclassified",
        }
    }
}

impl std::fmt::Display for ComplianceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
