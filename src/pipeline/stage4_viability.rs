use tracing::{debug, warn};

use crate::model::thresholds::ThresholdProfile;
use crate::model::well::{Reporter, WellTable};
use crate::stats;

/// Stage 4 output: per-reporter viability gate flags, in table order.
/// A well passes when its viability proxy reaches the configured
/// fraction of the plate median. Missing proxies and degenerate plate
/// medians fail closed.
#[derive(Debug, Clone)]
pub struct ViabilityColumns {
    pub r1: Vec<bool>,
    pub r2: Vec<bool>,
}

impl ViabilityColumns {
    pub fn get(&self, reporter: Reporter) -> &[bool] {
        match reporter {
            Reporter::R1 => &self.r1,
            Reporter::R2 => &self.r2,
        }
    }
}

pub fn run_stage4(
    table: &WellTable,
    profile: &ThresholdProfile,
    warnings: &mut Vec<String>,
) -> ViabilityColumns {
    let columns = ViabilityColumns {
        r1: gate_column(table, Reporter::R1, profile, warnings),
        r2: gate_column(table, Reporter::R2, profile, warnings),
    };
    debug!(wells = table.len(), "applied viability gate");
    columns
}

fn gate_column(
    table: &WellTable,
    reporter: Reporter,
    profile: &ThresholdProfile,
    warnings: &mut Vec<String>,
) -> Vec<bool> {
    let wells = table.wells();
    let mut out = vec![false; wells.len()];
    for (plate, indices) in table.plate_indices() {
        let proxies: Vec<Option<f64>> = indices
            .iter()
            .map(|&i| wells[i].viability(reporter))
            .collect();
        let median = match stats::median(&proxies) {
            Some(m) if m > 0.0 => m,
            _ => {
                warn!(
                    plate = %plate,
                    reporter = reporter.label(),
                    "viability median missing or non-positive; gate fails closed"
                );
                warnings.push(format!(
                    "plate {plate}: {} viability median missing or not positive; \
                     all wells fail the viability gate",
                    reporter.label()
                ));
                continue;
            }
        };
        let threshold = profile.viability_fraction * median;
        for (&i, proxy) in indices.iter().zip(&proxies) {
            // Inclusive: a proxy exactly at the threshold passes.
            out[i] = proxy.is_some_and(|v| !v.is_nan() && v >= threshold);
        }
    }
    out
}
