use tracing::debug;

use crate::model::well::{Reporter, WellTable};

/// Stage 1 output: one reporter-ratio column per reporter, in table
/// order.
#[derive(Debug, Clone)]
pub struct RatioColumns {
    pub r1: Vec<Option<f64>>,
    pub r2: Vec<Option<f64>>,
}

impl RatioColumns {
    pub fn get(&self, reporter: Reporter) -> &[Option<f64>] {
        match reporter {
            Reporter::R1 => &self.r1,
            Reporter::R2 => &self.r2,
        }
    }
}

pub fn run_stage1(table: &WellTable) -> RatioColumns {
    let columns = RatioColumns {
        r1: ratio_column(table, Reporter::R1),
        r2: ratio_column(table, Reporter::R2),
    };
    debug!(wells = table.len(), "computed reporter ratios");
    columns
}

fn ratio_column(table: &WellTable, reporter: Reporter) -> Vec<Option<f64>> {
    table
        .wells()
        .iter()
        .map(|well| ratio(well.signal(reporter), well.viability(reporter)))
        .collect()
}

/// Signal over viability proxy with explicit missing semantics:
/// `x / 0` for nonzero `x` is infinite but present, `0 / 0` is missing,
/// and a missing (or NaN) operand is missing.
fn ratio(signal: Option<f64>, viability: Option<f64>) -> Option<f64> {
    let (signal, viability) = match (signal, viability) {
        (Some(s), Some(v)) => (s, v),
        _ => return None,
    };
    if signal.is_nan() || viability.is_nan() {
        return None;
    }
    if signal == 0.0 && viability == 0.0 {
        return None;
    }
    Some(signal / viability)
}
