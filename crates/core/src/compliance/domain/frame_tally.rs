use super::compliance_category::ComplianceCategory;

/// Per-frame detection counts, one slot per [`ComplianceCategory`].
///
/// Every detection lands in exactly one slot; `Unclassified` holds the
/// labels no rule matched and is left out of [`FrameTally::classified_total`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameTally {
    counts: [usize; ComplianceCategory::COUNT],
}

impl FrameTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, category: ComplianceCategory) {
        self.counts[category.index()] += 1;
    }

    pub fn get(&self, category: ComplianceCategory) -> usize {
        self.counts[category.index()]
    }

    /// All categories in declaration order, including zero counts.
    pub fn iter(&self) -> impl Iterator<Item = (ComplianceCategory, usize)> + '_ {
        ComplianceCategory::ALL
            .into_iter()
            .map(move |c| (c, self.counts[c.index()]))
    }

    /// Detections that mapped to a real category.
    pub fn classified_total(&self) -> usize {
        self.iter()
            .filter(|(c, _)| *c != ComplianceCategory::Unclassified)
            .map(|(_, n)| n)
            .sum()
    }

    pub fn unclassified(&self) -> usize {
        self.get(ComplianceCategory::Unclassified)
    }

    pub fn violation_total(&self) -> usize {
        ComplianceCategory::VIOLATIONS
            .iter()
            .map(|c| self.get(*c))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&n| n == 0)
    }
}
