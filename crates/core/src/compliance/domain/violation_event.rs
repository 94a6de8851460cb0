use super::compliance_category::ComplianceCategory;

/// A single detection that put its frame out of compliance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViolationEvent {
    category: ComplianceCategory,
    confidence: f32,
}

impl ViolationEvent {
    /// Returns `None` unless `category` is one of the negated-equipment categories.
    pub fn new(category: ComplianceCategory, confidence: f32) -> Option<Self> {
        category.is_violation().then_some(Self {
            category,
            confidence,
        })
    }

    pub fn category(&self) -> ComplianceCategory {
        self.category
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_categories_produce_events() {
        for category in ComplianceCategory::VIOLATIONS {
            let event = ViolationEvent::new(category, 0.7).unwrap();
            assert_eq!(event.category(), category);
            assert_eq!(event.confidence(), 0.7);
        }
    }

    #[test]
    fn test_non_violation_categories_are_rejected() {
        assert!(ViolationEvent::new(ComplianceCategory::Hardhat, 0.9).is_none());
        assert!(ViolationEvent::new(ComplianceCategory::Person, 0.9).is_none());
        assert!(ViolationEvent::new(ComplianceCategory::Unclassified, 0.9).is_none());
    }
}
