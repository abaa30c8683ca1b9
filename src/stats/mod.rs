//! Robust statistical primitives.
//!
//! Every function here follows one contract: numeric degeneracy (no valid
//! data, zero spread) produces `None`, never a panic and never an `Err`.
//! A `None` entry or a NaN in the input counts as missing and is ignored.

use serde::Serialize;

/// Consistency constant making MAD comparable to the standard deviation
/// under a normal-population assumption.
pub const MAD_SCALE: f64 = 1.4826;

/// Collects the valid (present, non-NaN) entries of a missing-capable slice.
pub fn valid_values(values: &[Option<f64>]) -> Vec<f64> {
    values
        .iter()
        .filter_map(|v| *v)
        .filter(|v| !v.is_nan())
        .collect()
}

fn median_in_place(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len();
    if n % 2 == 1 {
        Some(values[n / 2])
    } else {
        Some((values[n / 2 - 1] + values[n / 2]) / 2.0)
    }
}

/// Median ignoring missing entries; `None` if nothing valid remains.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut valid = valid_values(values);
    median_in_place(&mut valid)
}

/// Median absolute deviation from the median.
///
/// Exactly `0.0` for a constant array; `None` when no valid data exists.
pub fn mad(values: &[Option<f64>]) -> Option<f64> {
    let valid = valid_values(values);
    let med = median_in_place(&mut valid.clone())?;
    let mut deviations: Vec<f64> = valid.iter().map(|v| (v - med).abs()).collect();
    median_in_place(&mut deviations)
}

/// One robust Z value: `(x - median) / (1.4826 * mad)`.
///
/// `None` when the spread is zero; standardizing a population with no
/// spread is undefined, not zero.
pub fn robust_z(x: f64, median: f64, mad: f64) -> Option<f64> {
    if mad == 0.0 || mad.is_nan() {
        return None;
    }
    Some((x - median) / (MAD_SCALE * mad))
}

/// Elementwise robust Z against the input's own median and MAD.
///
/// Missing entries stay missing. A zero MAD turns every output into
/// `None`. Output length always equals input length.
pub fn robust_zscores(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let med = median(values);
    let spread = mad(values);
    let (med, spread) = match (med, spread) {
        (Some(m), Some(s)) if s > 0.0 => (m, s),
        _ => return vec![None; values.len()],
    };
    values
        .iter()
        .map(|v| match v {
            Some(x) if !x.is_nan() => robust_z(*x, med, spread),
            _ => None,
        })
        .collect()
}

/// Read-only diagnostic bundle over one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub missing: usize,
    pub median: Option<f64>,
    pub mad: Option<f64>,
    pub p25: Option<f64>,
    pub p75: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Count, median, MAD, quartiles and extrema of one column. No side effects.
pub fn summary(values: &[Option<f64>]) -> SummaryStats {
    let mut valid = valid_values(values);
    let missing = values.len() - valid.len();
    valid.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let med = sorted_median(&valid);
    let spread = mad(values);
    SummaryStats {
        count: valid.len(),
        missing,
        median: med,
        mad: spread,
        p25: sorted_quantile(&valid, 0.25),
        p75: sorted_quantile(&valid, 0.75),
        min: valid.first().copied(),
        max: valid.last().copied(),
    }
}

fn sorted_median(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

fn sorted_quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    // Nearest-rank with the ceiling convention.
    let idx = ((sorted.len() - 1) as f64 * p).ceil() as usize;
    Some(sorted[idx])
}

/// Nearest-rank quantile over the valid entries.
pub fn quantile(values: &[Option<f64>], p: f64) -> Option<f64> {
    let mut valid = valid_values(values);
    valid.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted_quantile(&valid, p)
}

/// Average ranks (1-based); ties share the mean of their rank range.
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let mut out = vec![0.0; values.len()];
    let mut i = 0usize;
    while i < indexed.len() {
        let mut end = i + 1;
        while end < indexed.len() && indexed[end].1 == indexed[i].1 {
            end += 1;
        }
        let rank = (i + end - 1) as f64 * 0.5 + 1.0;
        for item in &indexed[i..end] {
            out[item.0] = rank;
        }
        i = end;
    }
    out
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }
    let mx = x.iter().sum::<f64>() / n as f64;
    let my = y.iter().sum::<f64>() / n as f64;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx * vy).sqrt())
}

/// Spearman rank correlation; `None` below two points or with zero rank
/// variance in either input.
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    pearson(&ranks(x), &ranks(y))
}

/// Standard normal CDF, Abramowitz-Stegun 7.1.26 approximation.
///
/// Good to ~1e-7; used only for coarse significance heuristics.
pub fn normal_cdf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs() / std::f64::consts::SQRT_2;

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    0.5 * (1.0 + sign * y)
}

pub fn clip01(x: f64) -> f64 {
    if x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}
