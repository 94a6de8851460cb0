use super::compliance_category::ComplianceCategory;

/// Equipment terms a negation marker may be glued to, as in `NoHardhat`.
const NEGATABLE_TERMS: &[&str] = &["hardhat", "mask", "vest", "safety"];

/// How a rule tests a lowercased label.
#[derive(Clone, Copy, Debug)]
enum Condition {
    /// Negation marker present and any of the terms present.
    Negated(&'static [&'static str]),
    /// No negation marker and any of the terms present.
    Affirmed(&'static [&'static str]),
    /// Any of the terms present, regardless of negation.
    Contains(&'static [&'static str]),
}

/// One row of the ordered classification table.
#[derive(Clone, Copy, Debug)]
pub struct ClassificationRule {
    condition: Condition,
    category: ComplianceCategory,
}

impl ClassificationRule {
    pub const fn negated(terms: &'static [&'static str], category: ComplianceCategory) -> Self {
        Self {
            condition: Condition::Negated(terms),
            category,
        }
    }

    pub const fn affirmed(terms: &'static [&'static str], category: ComplianceCategory) -> Self {
        Self {
            condition: Condition::Affirmed(terms),
            category,
        }
    }

    pub const fn contains(terms: &'static [&'static str], category: ComplianceCategory) -> Self {
        Self {
            condition: Condition::Contains(terms),
            category,
        }
    }

    pub fn category(&self) -> ComplianceCategory {
        self.category
    }

    fn matches(&self, label: &str, negated: bool) -> bool {
        let any = |terms: &[&str]| terms.iter().any(|t| label.contains(t));
        match self.condition {
            Condition::Negated(terms) => negated && any(terms),
            Condition::Affirmed(terms) => !negated && any(terms),
            Condition::Contains(terms) => any(terms),
        }
    }
}

/// Negation rules come first so a negated label can never reach the
/// positive rule for the same equipment.
pub const DEFAULT_RULES: &[ClassificationRule] = &[
    ClassificationRule::negated(&["hardhat"], ComplianceCategory::NoHardhat),
    ClassificationRule::negated(&["mask"], ComplianceCategory::NoMask),
    ClassificationRule::negated(&["vest"], ComplianceCategory::NoVest),
    ClassificationRule::affirmed(&["hardhat"], ComplianceCategory::Hardhat),
    ClassificationRule::affirmed(&["mask"], ComplianceCategory::Mask),
    ClassificationRule::affirmed(&["safety vest", "vest"], ComplianceCategory::SafetyVest),
    ClassificationRule::contains(&["person"], ComplianceCategory::Person),
    ClassificationRule::contains(&["cone"], ComplianceCategory::SafetyCone),
    ClassificationRule::contains(&["machinery"], ComplianceCategory::Machinery),
    ClassificationRule::contains(&["vehicle"], ComplianceCategory::Vehicle),
];

/// Maps raw detector labels to [`ComplianceCategory`] through an ordered,
/// first-match-wins rule table. Matching is case-insensitive.
#[derive(Clone, Debug)]
pub struct LabelClassifier {
    rules: Vec<ClassificationRule>,
}

impl LabelClassifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ClassificationRule] {
        &self.rules
    }

    /// Total: labels no rule matches become [`ComplianceCategory::Unclassified`].
    pub fn classify(&self, label: &str) -> ComplianceCategory {
        let lowered = label.to_lowercase();
        let negated = has_negation_marker(&lowered);
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered, negated))
            .map(ClassificationRule::category)
            .unwrap_or(ComplianceCategory::Unclassified)
    }
}

impl Default for LabelClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

/// Classifies with the default rule table.
pub fn classify(label: &str) -> ComplianceCategory {
    LabelClassifier::default().classify(label)
}

const NEGATION_WORDS: &[&str] = &["no", "not"];

/// Detects a standalone negation word (`NO-Hardhat`, `no_mask`,
/// `hardhat_not_worn`) or one fused to an equipment term (`NoHardhat`,
/// `NotHardhat`). Expects lowercase input.
fn has_negation_marker(lowered: &str) -> bool {
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| {
            NEGATION_WORDS.iter().any(|marker| {
                word == *marker
                    || word
                        .strip_prefix(marker)
                        .is_some_and(|rest| NEGATABLE_TERMS.iter().any(|t| rest.starts_with(t)))
            })
        })
}
