use tracing::{debug, warn};

use crate::model::well::{Reporter, WellTable};
use crate::pipeline::stage1_ratios::RatioColumns;
use crate::stats;

/// Stage 3 output: per-reporter robust Z-scores of the reporter
/// ratios, scored within each plate, in table order.
#[derive(Debug, Clone)]
pub struct ZScoreColumns {
    pub r1: Vec<Option<f64>>,
    pub r2: Vec<Option<f64>>,
}

impl ZScoreColumns {
    pub fn get(&self, reporter: Reporter) -> &[Option<f64>] {
        match reporter {
            Reporter::R1 => &self.r1,
            Reporter::R2 => &self.r2,
        }
    }
}

pub fn run_stage3(
    table: &WellTable,
    ratios: &RatioColumns,
    warnings: &mut Vec<String>,
) -> ZScoreColumns {
    let columns = ZScoreColumns {
        r1: zscore_column(table, Reporter::R1, &ratios.r1, warnings),
        r2: zscore_column(table, Reporter::R2, &ratios.r2, warnings),
    };
    debug!(wells = table.len(), "scored reporter ratios");
    columns
}

fn zscore_column(
    table: &WellTable,
    reporter: Reporter,
    values: &[Option<f64>],
    warnings: &mut Vec<String>,
) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    for (plate, indices) in table.plate_indices() {
        let subset: Vec<Option<f64>> = indices.iter().map(|&i| values[i]).collect();
        match stats::mad(&subset) {
            None => {
                warn!(
                    plate = %plate,
                    reporter = reporter.label(),
                    "ratio column has no valid data; robust Z-scores undefined"
                );
                warnings.push(format!(
                    "plate {plate}: {} ratio column has no valid data; \
                     robust Z-scores left missing",
                    reporter.label()
                ));
                continue;
            }
            Some(m) if m == 0.0 => {
                warn!(
                    plate = %plate,
                    reporter = reporter.label(),
                    "ratio spread is zero; robust Z-scores undefined"
                );
                warnings.push(format!(
                    "plate {plate}: {} ratio MAD is zero; robust Z-scores left missing",
                    reporter.label()
                ));
                continue;
            }
            Some(_) => {}
        }
        for (&i, z) in indices.iter().zip(stats::robust_zscores(&subset)) {
            out[i] = z;
        }
    }
    out
}
