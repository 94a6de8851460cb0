use super::compliance_category::ComplianceCategory;
use super::frame_tally::FrameTally;
use super::violation_event::ViolationEvent;

/// Cumulative counters for one monitoring session.
///
/// Owned by exactly one session controller; counters only ever grow.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    frames_processed: u64,
    violation_frames: u64,
    totals: [u64; ComplianceCategory::COUNT],
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one processed frame into the session.
    ///
    /// Counters saturate instead of wrapping, so no counter can decrease in
    /// any build profile.
    pub fn record_frame(&mut self, tally: &FrameTally, violations: &[ViolationEvent]) {
        let before = self.clone();
        self.frames_processed = self.frames_processed.saturating_add(1);
        if !violations.is_empty() {
            self.violation_frames = self.violation_frames.saturating_add(1);
        }
        for (category, count) in tally.iter() {
            let total = &mut self.totals[category.index()];
            *total = total.saturating_add(count as u64);
        }
        if !self.invariants_hold() || !self.dominates(&before) {
            log::error!("Session counters out of order after frame {}", self.frames_processed);
        }
    }

    /// `true` when no counter is below its value in `earlier`.
    pub fn dominates(&self, earlier: &SessionStats) -> bool {
        self.frames_processed >= earlier.frames_processed
            && self.violation_frames >= earlier.violation_frames
            && self
                .totals
                .iter()
                .zip(earlier.totals.iter())
                .all(|(now, then)| now >= then)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn violation_frames(&self) -> u64 {
        self.violation_frames
    }

    pub fn compliant_frames(&self) -> u64 {
        self.frames_processed - self.violation_frames
    }

    pub fn total(&self, category: ComplianceCategory) -> u64 {
        self.totals[category.index()]
    }

    /// Per-category totals in declaration order.
    pub fn totals(&self) -> impl Iterator<Item = (ComplianceCategory, u64)> + '_ {
        ComplianceCategory::ALL
            .into_iter()
            .map(move |c| (c, self.totals[c.index()]))
    }

    /// Percentage of processed frames without a violation; 0 before any frame.
    pub fn compliance_rate(&self) -> f64 {
        if self.frames_processed == 0 {
            return 0.0;
        }
        self.compliant_frames() as f64 / self.frames_processed as f64 * 100.0
    }

    /// `violation_frames` can never exceed `frames_processed`.
    pub fn invariants_hold(&self) -> bool {
        self.violation_frames <= self.frames_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ComplianceCategory::*;

    fn tally(categories: &[ComplianceCategory]) -> FrameTally {
        let mut t = FrameTally::new();
        for c in categories {
            t.increment(*c);
        }
        t
    }

    fn violation(category: ComplianceCategory) -> ViolationEvent {
        ViolationEvent::new(category, 0.9).unwrap()
    }

    #[test]
    fn test_new_session_is_zeroed() {
        let stats = SessionStats::new();
        assert_eq!(stats.frames_processed(), 0);
        assert_eq!(stats.violation_frames(), 0);
        assert!(stats.totals().all(|(_, n)| n == 0));
    }

    #[test]
    fn test_compliance_rate_without_frames_is_zero() {
        let rate = SessionStats::new().compliance_rate();
        assert_eq!(rate, 0.0);
        assert!(!rate.is_nan());
    }

    #[test]
    fn test_record_violation_frame() {
        let mut stats = SessionStats::new();
        let t = tally(&[
            ComplianceCategory::NoHardhat,
            ComplianceCategory::Person,
            ComplianceCategory::SafetyVest,
        ]);
        stats.record_frame(&t, &[violation(ComplianceCategory::NoHardhat)]);
        assert_eq!(stats.frames_processed(), 1);
        assert_eq!(stats.violation_frames(), 1);
        assert_eq!(stats.total(ComplianceCategory::NoHardhat), 1);
        assert_relative_eq!(stats.compliance_rate(), 0.0);
    }

    #[test]
    fn test_compliant_frame_leaves_violation_frames_unchanged() {
        let mut stats = SessionStats::new();
        let t = tally(&[ComplianceCategory::Hardhat, ComplianceCategory::Person]);
        stats.record_frame(&t, &[]);
        assert_eq!(stats.frames_processed(), 1);
        assert_eq!(stats.violation_frames(), 0);
        assert_relative_eq!(stats.compliance_rate(), 100.0);
    }

    #[test]
    fn test_totals_equal_sum_of_recorded_tallies() {
        let frames = vec![
            tally(&[ComplianceCategory::Hardhat, ComplianceCategory::Hardhat]),
            tally(&[ComplianceCategory::NoMask]),
            tally(&[]),
            tally(&[ComplianceCategory::Hardhat, ComplianceCategory::Unclassified]),
        ];
        let mut stats = SessionStats::new();
        for t in &frames {
            let violations: Vec<_> = t
                .iter()
                .filter(|(c, n)| c.is_violation() && *n > 0)
                .map(|(c, _)| violation(c))
                .collect();
            let before = stats.clone();
            stats.record_frame(t, &violations);
            for category in ComplianceCategory::ALL {
                assert!(stats.total(category) >= before.total(category));
            }
        }

        assert_eq!(stats.frames_processed(), frames.len() as u64);
        for category in ComplianceCategory::ALL {
            let expected: usize = frames.iter().map(|t| t.get(category)).sum();
            assert_eq!(stats.total(category), expected as u64, "{category}");
        }
        assert_eq!(stats.violation_frames(), 1);
        assert!(stats.invariants_hold());
    }

    #[test]
    fn test_compliance_rate_mixed() {
        let mut stats = SessionStats::new();
        stats.record_frame(&FrameTally::new(), &[]);
        stats.record_frame(&FrameTally::new(), &[]);
        stats.record_frame(&FrameTally::new(), &[]);
        stats.record_frame(
            &tally(&[ComplianceCategory::NoVest]),
            &[violation(ComplianceCategory::NoVest)],
        );
        assert_relative_eq!(stats.compliance_rate(), 75.0);
        assert_eq!(stats.compliant_frames(), 3);
    }

    #[test]
    fn test_counters_saturate_instead_of_wrapping() {
        let mut stats = SessionStats {
            frames_processed: u64::MAX,
            violation_frames: u64::MAX,
            totals: [u64::MAX; ComplianceCategory::COUNT],
        };
        let before = stats.clone();
        let violation = ViolationEvent::new(NoMask, 0.8).unwrap();

        stats.record_frame(&tally(&[NoMask, Person]), &[violation]);

        assert!(stats.dominates(&before));
        assert_eq!(stats.frames_processed(), u64::MAX);
        assert_eq!(stats.total(NoMask), u64::MAX);
        assert!(stats.invariants_hold());
    }

    #[test]
    fn test_every_recorded_frame_dominates_the_previous_state() {
        let mut stats = SessionStats::new();
        let frames = [vec![Person, Hardhat], vec![], vec![NoHardhat, NoHardhat]];
        for categories in &frames {
            let before = stats.clone();
            stats.record_frame(&tally(categories), &[]);
            assert!(stats.dominates(&before));
            assert!(!before.dominates(&stats));
        }
    }
}
