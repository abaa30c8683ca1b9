//! Median-polish bias correction ("B-scoring").
//!
//! A plate metric is decomposed into additive row effects, column
//! effects and a residual; the residuals are then robustly rescaled.
//! The resulting B-score reads like a robust Z-score with positional
//! bias (edge drift, gradients) removed.

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::plate::PlateMatrix;
use crate::model::well::WellTable;
use crate::stats;

pub mod cache;

/// Outcome of one median-polish decomposition.
///
/// `residuals` is exactly `original - row_effect - col_effect` per
/// non-missing cell, so the reconstruction identity holds by
/// construction. `converged == false` means the iteration cap was hit
/// first; the partial result is still usable.
#[derive(Debug, Clone)]
pub struct MedianPolishFit {
    pub row_effects: Vec<f64>,
    pub col_effects: Vec<f64>,
    pub residuals: PlateMatrix,
    pub iterations: u32,
    pub converged: bool,
    pub max_delta: f64,
}

/// One polished matrix: the rescaled scores plus the underlying fit.
#[derive(Debug, Clone)]
pub struct BScoreFit {
    pub scores: PlateMatrix,
    pub polish: MedianPolishFit,
}

/// Convergence diagnostics for one (plate, metric) polish, carried into
/// the run report.
#[derive(Debug, Clone, Serialize)]
pub struct PolishRecord {
    pub plate: String,
    pub metric: String,
    pub iterations: u32,
    pub converged: bool,
    pub max_delta: f64,
}

/// Tukey median polish over one plate matrix.
///
/// Each iteration row-centers then column-centers the residuals;
/// missing cells are excluded from every median and never contribute to
/// another cell's effect. Stops when the largest absolute residual
/// change drops below `tol`, or at `max_iter` sweeps, whichever comes
/// first. Hitting the cap is not an error.
pub fn median_polish(matrix: &PlateMatrix, max_iter: u32, tol: f64) -> MedianPolishFit {
    let rows = matrix.rows();
    let cols = matrix.cols();
    let mut row_effects = vec![0.0f64; rows];
    let mut col_effects = vec![0.0f64; cols];

    let mut previous = residual_snapshot(matrix, &row_effects, &col_effects);
    let mut iterations = 0u32;
    let mut converged = false;
    let mut max_delta = 0.0f64;

    while iterations < max_iter {
        for r in 0..rows {
            let values: Vec<Option<f64>> = (0..cols)
                .map(|c| matrix.get(r, c).map(|v| v - row_effects[r] - col_effects[c]))
                .collect();
            if let Some(center) = stats::median(&values) {
                row_effects[r] += center;
            }
        }
        for c in 0..cols {
            let values: Vec<Option<f64>> = (0..rows)
                .map(|r| matrix.get(r, c).map(|v| v - row_effects[r] - col_effects[c]))
                .collect();
            if let Some(center) = stats::median(&values) {
                col_effects[c] += center;
            }
        }
        iterations += 1;

        let current = residual_snapshot(matrix, &row_effects, &col_effects);
        max_delta = 0.0;
        for (new, old) in current.values().iter().zip(previous.values()) {
            if let (Some(new), Some(old)) = (new, old) {
                max_delta = max_delta.max((new - old).abs());
            }
        }
        previous = current;

        if max_delta < tol {
            converged = true;
            break;
        }
    }

    MedianPolishFit {
        row_effects,
        col_effects,
        residuals: previous,
        iterations,
        converged,
        max_delta,
    }
}

fn residual_snapshot(
    matrix: &PlateMatrix,
    row_effects: &[f64],
    col_effects: &[f64],
) -> PlateMatrix {
    let mut out = PlateMatrix::new(matrix.rows(), matrix.cols());
    for r in 0..matrix.rows() {
        for c in 0..matrix.cols() {
            out.set(
                r,
                c,
                matrix.get(r, c).map(|v| v - row_effects[r] - col_effects[c]),
            );
        }
    }
    out
}

/// Polishes a matrix and rescales the residuals into B-scores.
///
/// The score for a cell is the robust Z of its residual against the
/// flattened residual population; a zero residual MAD turns the whole
/// score matrix missing.
pub fn bscore_matrix(matrix: &PlateMatrix, max_iter: u32, tol: f64) -> BScoreFit {
    let polish = median_polish(matrix, max_iter, tol);
    let z = stats::robust_zscores(polish.residuals.values());
    let mut scores = PlateMatrix::new(matrix.rows(), matrix.cols());
    for r in 0..matrix.rows() {
        for c in 0..matrix.cols() {
            scores.set(r, c, z[r * matrix.cols() + c]);
        }
    }
    BScoreFit { scores, polish }
}

/// Per-plate B-scores for one metric column, input order preserved.
///
/// Builds one matrix per plate from `values`, polishes each
/// independently, and scatters the scores back to table order. One
/// `PolishRecord` per plate is returned for diagnostics.
pub fn bscore_column(
    table: &WellTable,
    metric: &str,
    values: &[Option<f64>],
    max_iter: u32,
    tol: f64,
) -> (Vec<Option<f64>>, Vec<PolishRecord>) {
    bscore_column_inner(table, metric, values, max_iter, tol, None)
}

/// Same as [`bscore_column`] but consults a shared result cache first.
pub fn bscore_column_with_cache(
    table: &WellTable,
    metric: &str,
    values: &[Option<f64>],
    max_iter: u32,
    tol: f64,
    cache: &cache::BScoreCache,
) -> (Vec<Option<f64>>, Vec<PolishRecord>) {
    bscore_column_inner(table, metric, values, max_iter, tol, Some(cache))
}

fn bscore_column_inner(
    table: &WellTable,
    metric: &str,
    values: &[Option<f64>],
    max_iter: u32,
    tol: f64,
    cache: Option<&cache::BScoreCache>,
) -> (Vec<Option<f64>>, Vec<PolishRecord>) {
    let wells = table.wells();
    let mut out = vec![None; values.len()];
    let mut records = Vec::new();

    for (plate, indices) in table.plate_indices() {
        let matrix = PlateMatrix::from_wells(
            table.layout(),
            indices.iter().map(|&i| (wells[i].pos, values[i])),
        );
        let fit = match cache {
            Some(cache) => cache.get_or_compute(metric, &matrix, max_iter, tol),
            None => std::sync::Arc::new(bscore_matrix(&matrix, max_iter, tol)),
        };

        if matrix.valid_count() == 0 {
            warn!(
                plate = %plate,
                metric = %metric,
                "matrix has no valid cells; B-scores left missing"
            );
        } else if fit.polish.converged {
            debug!(
                plate = %plate,
                metric = %metric,
                iterations = fit.polish.iterations,
                "median polish converged"
            );
        } else {
            warn!(
                plate = %plate,
                metric = %metric,
                iterations = fit.polish.iterations,
                max_delta = fit.polish.max_delta,
                "median polish hit the iteration cap; using partial result"
            );
        }

        for &i in &indices {
            let pos = wells[i].pos;
            out[i] = fit.scores.get(pos.row as usize, pos.col as usize);
        }
        records.push(PolishRecord {
            plate: plate.to_string(),
            metric: metric.to_string(),
            iterations: fit.polish.iterations,
            converged: fit.polish.converged,
            max_delta: fit.polish.max_delta,
        });
    }

    (out, records)
}

#[cfg(test)]
#[path = "../../tests/src_inline/bscore/polish.rs"]
mod tests;
