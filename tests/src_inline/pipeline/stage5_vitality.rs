use super::*;
use crate::model::well::{WellPosition, WellRecord};

fn well(plate: &str, col: u8, wt: Option<f64>, tolc: Option<f64>, sa: Option<f64>) -> WellRecord {
    let mut w = WellRecord::new(plate, WellPosition::new(0, col));
    w.od_wt = wt;
    w.od_tolc = tolc;
    w.od_sa = sa;
    w
}

/// Five background wells at OD 1.0 pin every strain median to exactly
/// 1.0, so a sixth probe well's growth fraction equals its OD.
fn probe_table(wt: f64, tolc: f64, sa: f64) -> WellTable {
    let mut wells: Vec<WellRecord> = (0..5)
        .map(|c| well("p1", c, Some(1.0), Some(1.0), Some(1.0)))
        .collect();
    wells.push(well("p1", 5, Some(wt), Some(tolc), Some(sa)));
    WellTable::new(wells).unwrap()
}

fn run(table: &WellTable) -> (VitalityColumns, Vec<String>) {
    let mut warnings = Vec::new();
    let columns = run_stage5(table, &ThresholdProfile::default_v1(), &mut warnings);
    (columns, warnings)
}

#[test]
fn test_growth_is_od_over_plate_median() {
    let (columns, warnings) = run(&probe_table(2.0, 0.5, 1.5));
    assert_eq!(columns.growth_wt[5], Some(2.0));
    assert_eq!(columns.growth_tolc[5], Some(0.5));
    assert_eq!(columns.growth_sa[5], Some(1.5));
    assert!(warnings.is_empty());
}

#[test]
fn test_growth_clipped_at_ceiling() {
    let (columns, _) = run(&probe_table(50.0, 1.0, 1.0));
    assert_eq!(columns.growth_wt[5], Some(5.0));
}

#[test]
fn test_selective_inhibition_is_a_hit() {
    let (columns, _) = run(&probe_table(2.0, 0.1, 2.0));
    assert_eq!(columns.pattern[5], VitalityPattern::SelectiveInhibition);
    assert!(columns.hit[5]);
}

#[test]
fn test_tolc_boundary_is_inclusive() {
    // tolC growth exactly at the ceiling still counts as suppressed.
    let (columns, _) = run(&probe_table(2.0, 0.8, 2.0));
    assert!(columns.hit[5]);
}

#[test]
fn test_control_boundaries_are_strict() {
    let (wt_edge, _) = run(&probe_table(0.8, 0.5, 2.0));
    assert!(!wt_edge.hit[5]);
    assert_eq!(wt_edge.pattern[5], VitalityPattern::TolcSensitiveOnly);

    let (sa_edge, _) = run(&probe_table(2.0, 0.5, 0.8));
    assert!(!sa_edge.hit[5]);
    assert_eq!(sa_edge.pattern[5], VitalityPattern::TolcSensitiveOnly);
}

#[test]
fn test_growing_controls_without_suppression() {
    let (columns, _) = run(&probe_table(2.0, 1.5, 2.0));
    assert_eq!(columns.pattern[5], VitalityPattern::HighGrowthControls);
    assert!(!columns.hit[5]);
}

#[test]
fn test_background_wells_show_no_pattern_of_interest() {
    let (columns, _) = run(&probe_table(2.0, 0.1, 2.0));
    // Background growth is exactly 1.0 in every strain: not suppressed,
    // controls above their floors.
    assert_eq!(columns.pattern[0], VitalityPattern::HighGrowthControls);
    assert!(!columns.hit[0]);
}

#[test]
fn test_missing_od_means_missing_data_and_no_hit() {
    let mut wells: Vec<WellRecord> = (0..5)
        .map(|c| well("p1", c, Some(1.0), Some(1.0), Some(1.0)))
        .collect();
    wells.push(well("p1", 5, Some(2.0), None, Some(2.0)));
    let table = WellTable::new(wells).unwrap();
    let (columns, _) = run(&table);
    assert_eq!(columns.growth_tolc[5], None);
    assert_eq!(columns.pattern[5], VitalityPattern::MissingData);
    assert!(!columns.hit[5]);
}

#[test]
fn test_median_below_floor_drops_strain_for_plate() {
    let wells: Vec<WellRecord> = (0..4)
        .map(|c| well("p1", c, Some(1.0), Some(0.001), Some(1.0)))
        .collect();
    let table = WellTable::new(wells).unwrap();
    let (columns, warnings) = run(&table);
    assert!(columns.growth_tolc.iter().all(|g| g.is_none()));
    assert!(columns.growth_wt.iter().all(|g| g.is_some()));
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("tolc"));
    assert!(columns.pattern.iter().all(|p| *p == VitalityPattern::MissingData));
}

#[test]
fn test_summary_rows_excluded_from_median_but_scored() {
    let mut wells: Vec<WellRecord> = (0..5)
        .map(|c| well("p1", c, Some(1.0), Some(1.0), Some(1.0)))
        .collect();
    let mut summary = well("p1", 5, Some(100.0), Some(100.0), Some(100.0));
    summary.experimental = false;
    wells.push(summary);
    let table = WellTable::new(wells).unwrap();
    let (columns, _) = run(&table);
    // Median stays 1.0 because the summary row is excluded from it.
    assert_eq!(columns.growth_wt[0], Some(1.0));
    // The summary row itself still gets a (clipped) fraction.
    assert_eq!(columns.growth_wt[5], Some(5.0));
}

#[test]
fn test_hit_agrees_with_selective_inhibition_pattern() {
    let levels = [0.1, 0.5, 0.8, 0.9, 1.5, 3.0];
    for &wt in &levels {
        for &tolc in &levels {
            for &sa in &levels {
                let (columns, _) = run(&probe_table(wt, tolc, sa));
                let selective = columns.pattern[5] == VitalityPattern::SelectiveInhibition;
                assert_eq!(columns.hit[5], selective, "wt={wt} tolc={tolc} sa={sa}");
            }
        }
    }
}
