//! Spatial edge-effect diagnostics.
//!
//! Perimeter wells evaporate faster and sit closer to thermal
//! gradients, so their readings drift away from the plate interior.
//! This module quantifies that drift per (plate, metric) as a side
//! channel: it reads the analysis columns and produces diagnostic
//! records, never transformed data.

pub mod moran;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::PlateError;
use crate::model::plate::PlateMatrix;
use crate::model::severity::EdgeSeverity;
use crate::model::thresholds::ThresholdProfile;
use crate::model::well::WellTable;
use crate::stats;
use moran::MoranStat;

/// Row- or column-order trend of a plate metric.
#[derive(Debug, Clone, Serialize)]
pub struct TrendStat {
    /// Spearman rank correlation between line index and line median.
    pub rho: f64,
    /// Lines (rows or columns) that had any data.
    pub n: usize,
    /// Coarse call: `|rho|` at or above the configured threshold.
    pub significant: bool,
    /// Normal-approximation pseudo-p; a screening heuristic only.
    pub p_approx: f64,
}

/// Diagnostics for one metric on one plate.
///
/// Corner deviations are ordered top-left, top-right, bottom-left,
/// bottom-right.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeEffectReport {
    pub plate: String,
    pub metric: String,
    pub n_edge: usize,
    pub n_interior: usize,
    pub edge_median: Option<f64>,
    pub interior_median: Option<f64>,
    pub interior_mad: Option<f64>,
    /// `(median(edge) - median(interior)) / MAD(interior)`; missing when
    /// the interior spread is zero or either group is empty.
    pub effect_size: Option<f64>,
    pub row_trend: Option<TrendStat>,
    pub col_trend: Option<TrendStat>,
    pub corner_deviation: [Option<f64>; 4],
    pub corner_effect: bool,
    pub moran: Option<MoranStat>,
    pub severity: EdgeSeverity,
    /// Whether `|effect_size|` cleared even the info threshold.
    pub exceeds_info: bool,
}

/// Per-plate result slots for a multi-plate run. A failed plate keeps
/// its slot with the error; it never aborts the neighbors.
#[derive(Debug)]
pub struct EdgeDiagnostics {
    pub plates: Vec<PlateEdgeSlot>,
}

#[derive(Debug)]
pub struct PlateEdgeSlot {
    pub plate: String,
    pub outcome: Result<Vec<EdgeEffectReport>, PlateError>,
}

/// Runs edge diagnostics for every named metric column over every
/// plate in the table.
///
/// A plate with no valid data in any metric records
/// [`PlateError::NoData`] in its slot; all other plates proceed.
pub fn edge_diagnostics(
    table: &WellTable,
    metrics: &[(&str, &[Option<f64>])],
    profile: &ThresholdProfile,
) -> EdgeDiagnostics {
    let wells = table.wells();
    let mut plates = Vec::new();

    for (plate, indices) in table.plate_indices() {
        let mut reports = Vec::new();
        let mut any_data = false;

        for (metric, values) in metrics {
            let matrix = PlateMatrix::from_wells(
                table.layout(),
                indices.iter().map(|&i| (wells[i].pos, values[i])),
            );
            if matrix.valid_count() > 0 {
                any_data = true;
            }
            let report = analyze_matrix(plate, metric, &matrix, profile);
            if report.severity >= EdgeSeverity::Warn {
                warn!(
                    plate = %plate,
                    metric = %metric,
                    severity = report.severity.label(),
                    effect_size = report.effect_size.unwrap_or(f64::NAN),
                    "edge effect detected"
                );
            } else {
                debug!(plate = %plate, metric = %metric, "edge diagnostics clean");
            }
            reports.push(report);
        }

        let outcome = if any_data {
            Ok(reports)
        } else {
            let err = PlateError::NoData {
                plate: plate.to_string(),
            };
            warn!(plate = %plate, "skipping edge diagnostics: {err}");
            Err(err)
        };
        plates.push(PlateEdgeSlot {
            plate: plate.to_string(),
            outcome,
        });
    }

    EdgeDiagnostics { plates }
}

/// Edge diagnostics for a single metric matrix.
pub fn analyze_matrix(
    plate: &str,
    metric: &str,
    matrix: &PlateMatrix,
    profile: &ThresholdProfile,
) -> EdgeEffectReport {
    let rows = matrix.rows();
    let cols = matrix.cols();

    let mut edge_values = Vec::new();
    let mut interior_values = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            let cell = matrix.get(r, c);
            if cell.is_none() {
                continue;
            }
            if is_edge(r, c, rows, cols) {
                edge_values.push(cell);
            } else {
                interior_values.push(cell);
            }
        }
    }

    let edge_median = stats::median(&edge_values);
    let interior_median = stats::median(&interior_values);
    let interior_mad = stats::mad(&interior_values);

    let effect_size = match (edge_median, interior_median, interior_mad) {
        (Some(edge), Some(interior), Some(mad)) if mad > 0.0 => Some((edge - interior) / mad),
        _ => None,
    };

    let row_trend = line_trend(matrix, profile, Axis::Row);
    let col_trend = line_trend(matrix, profile, Axis::Col);

    let corner_deviation = corner_deviations(matrix, interior_median, interior_mad);
    let corner_effect = corner_deviation
        .iter()
        .flatten()
        .any(|d| *d >= profile.edge_corner);

    let moran = if profile.autocorrelation {
        moran::morans_i(matrix, profile.autocorrelation_radius)
    } else {
        None
    };

    let magnitude = effect_size.map(f64::abs);
    let severity = match magnitude {
        Some(d) if d >= profile.edge_critical => EdgeSeverity::Critical,
        Some(d) if d >= profile.edge_warn => EdgeSeverity::Warn,
        _ => EdgeSeverity::Info,
    };
    let exceeds_info = matches!(magnitude, Some(d) if d >= profile.edge_info);

    EdgeEffectReport {
        plate: plate.to_string(),
        metric: metric.to_string(),
        n_edge: edge_values.len(),
        n_interior: interior_values.len(),
        edge_median,
        interior_median,
        interior_mad,
        effect_size,
        row_trend,
        col_trend,
        corner_deviation,
        corner_effect,
        moran,
        severity,
        exceeds_info,
    }
}

fn is_edge(row: usize, col: usize, rows: usize, cols: usize) -> bool {
    row == 0 || row + 1 == rows || col == 0 || col + 1 == cols
}

enum Axis {
    Row,
    Col,
}

/// Spearman correlation of line index against line median; needs at
/// least three lines with data.
fn line_trend(matrix: &PlateMatrix, profile: &ThresholdProfile, axis: Axis) -> Option<TrendStat> {
    let (outer, inner) = match axis {
        Axis::Row => (matrix.rows(), matrix.cols()),
        Axis::Col => (matrix.cols(), matrix.rows()),
    };

    let mut indices = Vec::new();
    let mut medians = Vec::new();
    for line in 0..outer {
        let values: Vec<Option<f64>> = (0..inner)
            .map(|k| match axis {
                Axis::Row => matrix.get(line, k),
                Axis::Col => matrix.get(k, line),
            })
            .collect();
        if let Some(med) = stats::median(&values) {
            indices.push(line as f64);
            medians.push(med);
        }
    }

    if indices.len() < 3 {
        return None;
    }
    let rho = stats::spearman(&indices, &medians)?;
    let n = indices.len();
    // Large-sample approximation z = rho * sqrt(n - 1); coarse at plate
    // scale, kept as a screening aid.
    let z = rho * ((n - 1) as f64).sqrt();
    let p_approx = 2.0 * (1.0 - stats::normal_cdf(z.abs()));
    Some(TrendStat {
        rho,
        n,
        significant: rho.abs() >= profile.edge_trend_rho,
        p_approx,
    })
}

fn corner_deviations(
    matrix: &PlateMatrix,
    interior_median: Option<f64>,
    interior_mad: Option<f64>,
) -> [Option<f64>; 4] {
    // Interior stats require rows and cols of at least 3, so past this
    // guard the corner indexing cannot underflow.
    let (median, mad) = match (interior_median, interior_mad) {
        (Some(median), Some(mad)) if mad > 0.0 => (median, mad),
        _ => return [None; 4],
    };

    let rows = matrix.rows();
    let cols = matrix.cols();
    let corners = [
        (0, 0),
        (0, cols - 1),
        (rows - 1, 0),
        (rows - 1, cols - 1),
    ];

    let mut out = [None; 4];
    for (slot, &(r, c)) in out.iter_mut().zip(&corners) {
        *slot = matrix.get(r, c).map(|v| (v - median).abs() / mad);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/edge/detector.rs"]
mod tests;
