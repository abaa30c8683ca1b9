use tracing::{debug, warn};

use crate::model::patterns::VitalityPattern;
use crate::model::thresholds::ThresholdProfile;
use crate::model::well::{Strain, WellTable};
use crate::stats;

/// Stage 5 output: per-strain growth fractions relative to the plate
/// median, the per-well vitality pattern, and the vitality hit flag,
/// in table order.
#[derive(Debug, Clone)]
pub struct VitalityColumns {
    pub growth_wt: Vec<Option<f64>>,
    pub growth_tolc: Vec<Option<f64>>,
    pub growth_sa: Vec<Option<f64>>,
    pub pattern: Vec<VitalityPattern>,
    pub hit: Vec<bool>,
}

impl VitalityColumns {
    pub fn growth(&self, strain: Strain) -> &[Option<f64>] {
        match strain {
            Strain::Wt => &self.growth_wt,
            Strain::TolC => &self.growth_tolc,
            Strain::Sa => &self.growth_sa,
        }
    }
}

pub fn run_stage5(
    table: &WellTable,
    profile: &ThresholdProfile,
    warnings: &mut Vec<String>,
) -> VitalityColumns {
    let growth_wt = growth_column(table, Strain::Wt, profile, warnings);
    let growth_tolc = growth_column(table, Strain::TolC, profile, warnings);
    let growth_sa = growth_column(table, Strain::Sa, profile, warnings);

    let n = table.len();
    let mut pattern = Vec::with_capacity(n);
    let mut hit = Vec::with_capacity(n);
    for i in 0..n {
        pattern.push(classify_well(growth_wt[i], growth_tolc[i], growth_sa[i], profile));
        hit.push(vitality_hit(growth_wt[i], growth_tolc[i], growth_sa[i], profile));
    }
    debug!(
        wells = n,
        hits = hit.iter().filter(|h| **h).count(),
        "classified vitality patterns"
    );
    VitalityColumns {
        growth_wt,
        growth_tolc,
        growth_sa,
        pattern,
        hit,
    }
}

/// The vitality hit rule: tolC-strain growth at or below the ceiling,
/// both control strains strictly above their floors. Inclusive for
/// inhibition, strict for survival. Any missing fraction fails.
pub fn vitality_hit(
    wt: Option<f64>,
    tolc: Option<f64>,
    sa: Option<f64>,
    profile: &ThresholdProfile,
) -> bool {
    match (wt, tolc, sa) {
        (Some(wt), Some(tolc), Some(sa)) => {
            tolc <= profile.tolc_max && wt > profile.wt_min && sa > profile.sa_min
        }
        _ => false,
    }
}

/// Descriptive pattern for a well's growth triple. The pattern is a
/// readout for triage; the hit decision is [`vitality_hit`].
pub fn classify_well(
    wt: Option<f64>,
    tolc: Option<f64>,
    sa: Option<f64>,
    profile: &ThresholdProfile,
) -> VitalityPattern {
    let (wt, tolc, sa) = match (wt, tolc, sa) {
        (Some(wt), Some(tolc), Some(sa)) => (wt, tolc, sa),
        _ => return VitalityPattern::MissingData,
    };
    let tolc_suppressed = tolc <= profile.tolc_max;
    let controls_grow = wt > profile.wt_min && sa > profile.sa_min;
    if tolc_suppressed && controls_grow {
        return VitalityPattern::SelectiveInhibition;
    }
    if tolc_suppressed {
        return VitalityPattern::TolcSensitiveOnly;
    }
    if controls_grow {
        return VitalityPattern::HighGrowthControls;
    }
    VitalityPattern::NoPattern
}

fn growth_column(
    table: &WellTable,
    strain: Strain,
    profile: &ThresholdProfile,
    warnings: &mut Vec<String>,
) -> Vec<Option<f64>> {
    let wells = table.wells();
    let mut out = vec![None; wells.len()];
    for (plate, indices) in table.plate_indices() {
        // The plate median comes from experimental rows only; summary
        // rows would drag it toward artifacts.
        let experimental: Vec<Option<f64>> = indices
            .iter()
            .map(|&i| {
                if wells[i].experimental {
                    wells[i].od(strain)
                } else {
                    None
                }
            })
            .collect();
        let median = match stats::median(&experimental) {
            Some(m) if m > 0.0 && m >= profile.vitality_median_floor => m,
            _ => {
                warn!(
                    plate = %plate,
                    strain = strain.label(),
                    floor = profile.vitality_median_floor,
                    "growth median missing or below floor; growth left missing"
                );
                warnings.push(format!(
                    "plate {plate}: {} growth median missing or below floor; \
                     growth fractions left missing",
                    strain.label()
                ));
                continue;
            }
        };
        for &i in &indices {
            out[i] = wells[i]
                .od(strain)
                .filter(|v| !v.is_nan())
                .map(|v| (v / median).min(profile.growth_ceiling));
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_vitality.rs"]
mod tests;
