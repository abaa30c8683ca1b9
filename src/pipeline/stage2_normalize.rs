use tracing::{debug, warn};

use crate::model::well::{Strain, WellTable};
use crate::stats;

/// Stage 2 output: per-strain optical density normalized against the
/// strain's own plate median, in table order.
#[derive(Debug, Clone)]
pub struct NormalizedColumns {
    pub wt: Vec<Option<f64>>,
    pub tolc: Vec<Option<f64>>,
    pub sa: Vec<Option<f64>>,
}

impl NormalizedColumns {
    pub fn get(&self, strain: Strain) -> &[Option<f64>] {
        match strain {
            Strain::Wt => &self.wt,
            Strain::TolC => &self.tolc,
            Strain::Sa => &self.sa,
        }
    }
}

pub fn run_stage2(table: &WellTable, warnings: &mut Vec<String>) -> NormalizedColumns {
    let columns = NormalizedColumns {
        wt: normalized_column(table, Strain::Wt, warnings),
        tolc: normalized_column(table, Strain::TolC, warnings),
        sa: normalized_column(table, Strain::Sa, warnings),
    };
    debug!(wells = table.len(), "normalized strain optical densities");
    columns
}

fn normalized_column(
    table: &WellTable,
    strain: Strain,
    warnings: &mut Vec<String>,
) -> Vec<Option<f64>> {
    let wells = table.wells();
    let mut out = vec![None; wells.len()];
    for (plate, indices) in table.plate_indices() {
        let ods: Vec<Option<f64>> = indices.iter().map(|&i| wells[i].od(strain)).collect();
        let median = match stats::median(&ods) {
            Some(m) if m > 0.0 => m,
            other => {
                warn!(
                    plate = %plate,
                    strain = strain.label(),
                    "OD plate median missing or non-positive; normalized column left missing"
                );
                warnings.push(match other {
                    Some(m) => format!(
                        "plate {plate}: {} OD plate median {m} is not positive; \
                         normalized {} column left missing",
                        strain.label(),
                        strain.label()
                    ),
                    None => format!(
                        "plate {plate}: {} OD plate median is missing; \
                         normalized {} column left missing",
                        strain.label(),
                        strain.label()
                    ),
                });
                continue;
            }
        };
        for (&i, od) in indices.iter().zip(&ods) {
            out[i] = od.filter(|v| !v.is_nan()).map(|v| v / median);
        }
    }
    out
}
