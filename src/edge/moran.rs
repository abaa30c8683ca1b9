use serde::Serialize;

use crate::model::plate::PlateMatrix;
use crate::stats;

/// Moran's I spatial-autocorrelation statistic for one plate matrix.
///
/// The p-value comes from a normal approximation over a handful of
/// wells; treat it as a screening heuristic, never as a calibrated
/// test.
#[derive(Debug, Clone, Serialize)]
pub struct MoranStat {
    pub observed: f64,
    pub expected: f64,
    pub z: f64,
    pub p_approx: f64,
    pub n: usize,
}

/// Moran's I with inverse-distance weights for well pairs within
/// `radius` (euclidean, in well units).
///
/// Mean-centered, missing cells excluded entirely. `None` when fewer
/// than four valid wells exist, no pair falls inside the radius, or the
/// values carry no variance.
pub fn morans_i(matrix: &PlateMatrix, radius: f64) -> Option<MoranStat> {
    let mut cells = Vec::new();
    for r in 0..matrix.rows() {
        for c in 0..matrix.cols() {
            if let Some(v) = matrix.get(r, c) {
                cells.push((r as f64, c as f64, v));
            }
        }
    }
    let n = cells.len();
    if n < 4 {
        return None;
    }

    let mean = cells.iter().map(|&(_, _, v)| v).sum::<f64>() / n as f64;
    let deviations: Vec<f64> = cells.iter().map(|&(_, _, v)| v - mean).collect();
    let ss: f64 = deviations.iter().map(|d| d * d).sum();
    if ss == 0.0 {
        return None;
    }

    let mut s0 = 0.0;
    let mut s1 = 0.0;
    let mut cross = 0.0;
    let mut row_sums = vec![0.0f64; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let dr = cells[i].0 - cells[j].0;
            let dc = cells[i].1 - cells[j].1;
            let dist = (dr * dr + dc * dc).sqrt();
            if dist > radius {
                continue;
            }
            let w = 1.0 / dist;
            s0 += w;
            // Symmetric weights: (w_ij + w_ji)^2 / 2 collapses to 2 w^2.
            s1 += 2.0 * w * w;
            cross += w * deviations[i] * deviations[j];
            row_sums[i] += w;
        }
    }
    if s0 == 0.0 {
        return None;
    }

    let nf = n as f64;
    let observed = (nf / s0) * (cross / ss);
    let expected = -1.0 / (nf - 1.0);

    // Variance under the normality assumption; S2 uses doubled row sums
    // because in- and out-weights coincide.
    let s2: f64 = row_sums.iter().map(|r| (2.0 * r) * (2.0 * r)).sum();
    let var = (nf * nf * s1 - nf * s2 + 3.0 * s0 * s0) / ((nf * nf - 1.0) * s0 * s0)
        - expected * expected;
    if var <= 0.0 {
        return None;
    }
    let z = (observed - expected) / var.sqrt();
    let p_approx = 2.0 * (1.0 - stats::normal_cdf(z.abs()));

    Some(MoranStat {
        observed,
        expected,
        z,
        p_approx,
        n,
    })
}
