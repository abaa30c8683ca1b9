use serde::Serialize;

/// Diagnostic growth-pattern classification of one well.
///
/// Reported alongside the vitality hit but never consulted by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalityPattern {
    /// Full vitality-hit pattern: tolC suppressed, both controls grow.
    SelectiveInhibition,
    /// tolC suppressed but at least one control also fails to grow.
    TolcSensitiveOnly,
    /// Both controls grow strongly with no tolC suppression.
    HighGrowthControls,
    NoPattern,
    /// At least one growth value is missing.
    MissingData,
}

impl VitalityPattern {
    pub fn label(self) -> &'static str {
        match self {
            VitalityPattern::SelectiveInhibition => "selective_inhibition",
            VitalityPattern::TolcSensitiveOnly => "tolc_sensitive_only",
            VitalityPattern::HighGrowthControls => "high_growth_controls",
            VitalityPattern::NoPattern => "no_pattern",
            VitalityPattern::MissingData => "missing_data",
        }
    }
}

pub fn pattern_order() -> &'static [VitalityPattern] {
    &[
        VitalityPattern::SelectiveInhibition,
        VitalityPattern::TolcSensitiveOnly,
        VitalityPattern::HighGrowthControls,
        VitalityPattern::NoPattern,
        VitalityPattern::MissingData,
    ]
}
