use super::*;

use crate::model::plate::PlateLayout;
use crate::model::well::{WellPosition, WellRecord, WellTable};

fn noise(r: usize, c: usize) -> f64 {
    (((r * 12 + c) as f64) * 0.7368).sin() * 0.05
}

fn noisy_matrix() -> PlateMatrix {
    let mut m = PlateMatrix::new(8, 12);
    for r in 0..8 {
        for c in 0..12 {
            m.set(r, c, Some(noise(r, c)));
        }
    }
    m
}

#[test]
fn test_raised_edges_reach_warn() {
    let mut matrix = noisy_matrix();
    for r in 0..8 {
        for c in 0..12 {
            if r == 0 || r == 7 || c == 0 || c == 11 {
                matrix.set(r, c, Some(1.0));
            }
        }
    }
    let report = analyze_matrix("p1", "zscore_r1", &matrix, &ThresholdProfile::default_v1());
    assert_eq!(report.plate, "p1");
    assert_eq!(report.metric, "zscore_r1");
    assert_eq!(report.n_edge, 36);
    assert_eq!(report.n_interior, 60);
    assert!(report.effect_size.unwrap() > 0.0);
    assert!(report.severity >= EdgeSeverity::Warn);
    assert!(report.exceeds_info);
}

#[test]
fn test_constant_interior_has_no_effect_size() {
    let mut matrix = PlateMatrix::new(8, 12);
    for r in 0..8 {
        for c in 0..12 {
            let v = if r == 0 || r == 7 || c == 0 || c == 11 {
                noise(r, c)
            } else {
                3.0
            };
            matrix.set(r, c, Some(v));
        }
    }
    let report = analyze_matrix("p1", "zscore_r1", &matrix, &ThresholdProfile::default_v1());
    assert_eq!(report.effect_size, None);
    assert_eq!(report.severity, EdgeSeverity::Info);
    assert!(!report.exceeds_info);
    assert_eq!(report.corner_deviation, [None; 4]);
}

#[test]
fn test_zero_dimension_matrix_is_benign() {
    let report = analyze_matrix(
        "p1",
        "zscore_r1",
        &PlateMatrix::new(0, 0),
        &ThresholdProfile::default_v1(),
    );
    assert_eq!(report.n_edge, 0);
    assert_eq!(report.n_interior, 0);
    assert_eq!(report.effect_size, None);
    assert_eq!(report.corner_deviation, [None; 4]);
    assert_eq!(report.severity, EdgeSeverity::Info);
}

#[test]
fn test_row_gradient_trend() {
    let mut matrix = PlateMatrix::new(8, 12);
    for r in 0..8 {
        for c in 0..12 {
            matrix.set(r, c, Some(r as f64));
        }
    }
    let report = analyze_matrix("p1", "zscore_r1", &matrix, &ThresholdProfile::default_v1());

    let row = report.row_trend.unwrap();
    assert!(row.rho > 0.99);
    assert!(row.significant);
    assert_eq!(row.n, 8);
    assert!(row.p_approx < 0.05);

    // Column medians are all identical, so no column trend is defined.
    assert!(report.col_trend.is_none());

    // A pure gradient is not an edge-vs-interior shift.
    assert!(report.effect_size.unwrap().abs() < 1e-9);
    assert_eq!(report.severity, EdgeSeverity::Info);
}

#[test]
fn test_corner_spike() {
    let mut matrix = noisy_matrix();
    matrix.set(0, 0, Some(5.0));
    let report = analyze_matrix("p1", "zscore_r1", &matrix, &ThresholdProfile::default_v1());
    let top_left = report.corner_deviation[0].unwrap();
    assert!(top_left > 10.0, "deviation {top_left}");
    assert!(report.corner_effect);
}

#[test]
fn test_moran_behind_config_flag() {
    let mut matrix = noisy_matrix();
    for r in 0..8 {
        for c in 0..12 {
            let v = if c < 6 { 1.0 } else { -1.0 } + noise(r, c);
            matrix.set(r, c, Some(v));
        }
    }
    let mut profile = ThresholdProfile::default_v1();
    let report = analyze_matrix("p1", "zscore_r1", &matrix, &profile);
    assert!(report.moran.is_none());

    profile.autocorrelation = true;
    let report = analyze_matrix("p1", "zscore_r1", &matrix, &profile);
    let stat = report.moran.unwrap();
    assert!(stat.observed > 0.2);
}

#[test]
fn test_plate_failure_is_isolated() {
    let mut wells = Vec::new();
    let mut column = Vec::new();
    for r in 0..8u8 {
        for c in 0..12u8 {
            wells.push(WellRecord::new("p1", WellPosition::new(r, c)));
            column.push(Some(noise(r as usize, c as usize)));
            wells.push(WellRecord::new("p2", WellPosition::new(r, c)));
            column.push(None);
        }
    }
    let table = WellTable::with_layout(wells, PlateLayout::P96).unwrap();
    let profile = ThresholdProfile::default_v1();

    let diagnostics = edge_diagnostics(&table, &[("zscore_r1", &column)], &profile);
    assert_eq!(diagnostics.plates.len(), 2);
    assert_eq!(diagnostics.plates[0].plate, "p1");
    assert!(diagnostics.plates[0].outcome.is_ok());
    assert_eq!(diagnostics.plates[1].plate, "p2");
    assert!(matches!(
        diagnostics.plates[1].outcome,
        Err(PlateError::NoData { .. })
    ));
}

#[test]
fn test_one_report_per_metric() {
    let mut wells = Vec::new();
    let mut a = Vec::new();
    let mut b = Vec::new();
    for r in 0..8u8 {
        for c in 0..12u8 {
            wells.push(WellRecord::new("p1", WellPosition::new(r, c)));
            a.push(Some(noise(r as usize, c as usize)));
            b.push(Some(1.0 + noise(r as usize, c as usize)));
        }
    }
    let table = WellTable::with_layout(wells, PlateLayout::P96).unwrap();
    let profile = ThresholdProfile::default_v1();

    let diagnostics = edge_diagnostics(&table, &[("zscore_r1", &a), ("zscore_r2", &b)], &profile);
    let reports = diagnostics.plates[0].outcome.as_ref().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].metric, "zscore_r1");
    assert_eq!(reports[1].metric, "zscore_r2");
}
