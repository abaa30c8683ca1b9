use super::*;

use crate::model::plate::PlateLayout;
use crate::model::well::{WellPosition, WellRecord, WellTable};

// Deterministic, aperiodic cell noise; keeps every residual distinct so
// the residual MAD never degenerates to zero.
fn noise(r: usize, c: usize) -> f64 {
    (((r * 12 + c) as f64) * 0.7368).sin() * 0.05
}

fn noisy_additive_96() -> PlateMatrix {
    let mut m = PlateMatrix::new(8, 12);
    for r in 0..8 {
        for c in 0..12 {
            m.set(r, c, Some(r as f64 + 10.0 * c as f64 + noise(r, c)));
        }
    }
    m
}

#[test]
fn test_reconstruction_identity() {
    let mut matrix = noisy_additive_96();
    matrix.set(3, 7, Some(matrix.get(3, 7).unwrap() + 40.0));
    matrix.set(5, 2, None);

    let fit = median_polish(&matrix, 10, 1e-6);
    for r in 0..8 {
        for c in 0..12 {
            match (matrix.get(r, c), fit.residuals.get(r, c)) {
                (Some(original), Some(residual)) => {
                    let rebuilt = residual + fit.row_effects[r] + fit.col_effects[c];
                    assert!(
                        (original - rebuilt).abs() < 1e-9,
                        "cell ({r},{c}): {original} vs {rebuilt}"
                    );
                }
                (None, None) => {}
                other => panic!("missingness changed at ({r},{c}): {other:?}"),
            }
        }
    }
}

#[test]
fn test_additive_matrix_converges() {
    let mut matrix = PlateMatrix::new(8, 12);
    for r in 0..8 {
        for c in 0..12 {
            matrix.set(r, c, Some(r as f64 + 10.0 * c as f64));
        }
    }
    let fit = median_polish(&matrix, 10, 1e-6);
    assert!(fit.converged);
    assert!(fit.iterations <= 10);
    for cell in fit.residuals.values() {
        assert!(cell.unwrap().abs() < 1e-6);
    }
}

#[test]
fn test_constant_matrix_bscores_all_missing() {
    let mut matrix = PlateMatrix::new(8, 12);
    for r in 0..8 {
        for c in 0..12 {
            matrix.set(r, c, Some(7.5));
        }
    }
    let fit = bscore_matrix(&matrix, 10, 1e-6);
    assert!(fit.polish.converged);
    assert!(fit.scores.values().iter().all(|v| v.is_none()));
}

#[test]
fn test_missing_cells_stay_missing() {
    let mut matrix = noisy_additive_96();
    matrix.set(0, 0, None);
    matrix.set(4, 11, None);

    let fit = bscore_matrix(&matrix, 10, 1e-6);
    assert_eq!(fit.scores.get(0, 0), None);
    assert_eq!(fit.scores.get(4, 11), None);
    assert_eq!(fit.polish.residuals.get(0, 0), None);
    assert!(fit.scores.get(2, 2).is_some());
}

#[test]
fn test_spike_survives_bias_removal() {
    let mut matrix = noisy_additive_96();
    matrix.set(2, 4, Some(matrix.get(2, 4).unwrap() + 60.0));

    let fit = bscore_matrix(&matrix, 10, 1e-6);
    let spike = fit.scores.get(2, 4).unwrap();
    assert!(spike > 3.0, "spike score {spike} too small");

    let neighbor = fit.scores.get(2, 5).unwrap();
    assert!(neighbor.abs() < spike / 2.0);
}

#[test]
fn test_iteration_cap_is_not_an_error() {
    let mut matrix = PlateMatrix::new(8, 12);
    for r in 0..8 {
        for c in 0..12 {
            matrix.set(r, c, Some((r * c) as f64));
        }
    }
    let fit = median_polish(&matrix, 1, 1e-12);
    assert!(!fit.converged);
    assert_eq!(fit.iterations, 1);
    assert!(fit.max_delta > 0.0);
    // Partial results still reconstruct the input exactly.
    for r in 0..8 {
        for c in 0..12 {
            let rebuilt =
                fit.residuals.get(r, c).unwrap() + fit.row_effects[r] + fit.col_effects[c];
            assert!((matrix.get(r, c).unwrap() - rebuilt).abs() < 1e-9);
        }
    }
}

#[test]
fn test_column_scatter_is_per_plate_and_order_preserving() {
    let mut wells = Vec::new();
    let mut values = Vec::new();
    // Interleave two plates; p2 is p1 shifted by a constant.
    for r in 0..8u8 {
        for c in 0..12u8 {
            let base = r as f64 + 10.0 * c as f64 + noise(r as usize, c as usize);
            wells.push(WellRecord::new("p1", WellPosition::new(r, c)));
            values.push(Some(base));
            wells.push(WellRecord::new("p2", WellPosition::new(r, c)));
            values.push(Some(base + 100.0));
        }
    }
    let table = WellTable::with_layout(wells, PlateLayout::P96).unwrap();

    let (scores, records) = bscore_column(&table, "ratio_r1", &values, 10, 1e-6);
    assert_eq!(scores.len(), values.len());
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].plate, "p1");
    assert_eq!(records[1].plate, "p2");
    assert!(records.iter().all(|r| r.metric == "ratio_r1"));

    // Per-plate scoping plus location invariance: matching positions on
    // the two plates score the same.
    for pair in scores.chunks(2) {
        let (a, b) = (pair[0].unwrap(), pair[1].unwrap());
        assert!((a - b).abs() < 1e-9, "{a} vs {b}");
    }
}

#[test]
fn test_empty_plate_column_is_benign() {
    let mut wells = Vec::new();
    for c in 0..12u8 {
        wells.push(WellRecord::new("p1", WellPosition::new(0, c)));
    }
    let table = WellTable::with_layout(wells, PlateLayout::P96).unwrap();
    let values: Vec<Option<f64>> = vec![None; 12];

    let (scores, records) = bscore_column(&table, "ratio_r2", &values, 10, 1e-6);
    assert!(scores.iter().all(|s| s.is_none()));
    assert_eq!(records.len(), 1);
    assert!(records[0].converged);
}

#[test]
fn test_cached_column_reuses_fits() {
    let mut wells = Vec::new();
    let mut values = Vec::new();
    for r in 0..8u8 {
        for c in 0..12u8 {
            wells.push(WellRecord::new("p1", WellPosition::new(r, c)));
            values.push(Some(r as f64 + c as f64 + noise(r as usize, c as usize)));
        }
    }
    let table = WellTable::with_layout(wells, PlateLayout::P96).unwrap();
    let shared = cache::BScoreCache::new();

    let (first, _) = bscore_column_with_cache(&table, "ratio_r1", &values, 10, 1e-6, &shared);
    assert_eq!(shared.len(), 1);
    let (second, _) = bscore_column_with_cache(&table, "ratio_r1", &values, 10, 1e-6, &shared);
    assert_eq!(shared.len(), 1);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.map(f64::to_bits), b.map(f64::to_bits));
    }
}
