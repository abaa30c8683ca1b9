//! Run reports: per-well rows, per-plate summaries and the full-run
//! JSON document.
//!
//! The report is a snapshot: it embeds the threshold profile that
//! produced it, so a saved report can always be traced back to its
//! configuration.

pub mod text;

use serde::Serialize;

use crate::bscore::PolishRecord;
use crate::edge::{EdgeDiagnostics, EdgeEffectReport};
use crate::model::patterns::{pattern_order, VitalityPattern};
use crate::model::severity::EdgeSeverity;
use crate::model::thresholds::ThresholdProfile;
use crate::model::well::WellTable;
use crate::pipeline::AnalysisResult;
use crate::stats::{self, SummaryStats};

/// One analyzed well: the raw measurements plus every derived column.
#[derive(Debug, Clone, Serialize)]
pub struct WellReportRow {
    pub plate: String,
    pub well: String,
    pub experimental: bool,
    pub r1_signal: Option<f64>,
    pub r1_viability: Option<f64>,
    pub r2_signal: Option<f64>,
    pub r2_viability: Option<f64>,
    pub od_wt: Option<f64>,
    pub od_tolc: Option<f64>,
    pub od_sa: Option<f64>,
    pub ratio_r1: Option<f64>,
    pub ratio_r2: Option<f64>,
    pub norm_wt: Option<f64>,
    pub norm_tolc: Option<f64>,
    pub norm_sa: Option<f64>,
    pub zscore_r1: Option<f64>,
    pub zscore_r2: Option<f64>,
    pub bscore_r1: Option<f64>,
    pub bscore_r2: Option<f64>,
    pub viable_r1: bool,
    pub viable_r2: bool,
    pub growth_wt: Option<f64>,
    pub growth_tolc: Option<f64>,
    pub growth_sa: Option<f64>,
    pub vitality_pattern: VitalityPattern,
    pub r1_hit: bool,
    pub r2_hit: bool,
    pub reporter_hit: bool,
    pub vitality_hit: bool,
    pub platform_hit: bool,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternCount {
    pub pattern: VitalityPattern,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub stats: SummaryStats,
}

/// Aggregates for one plate.
#[derive(Debug, Clone, Serialize)]
pub struct PlateSummary {
    pub plate: String,
    pub wells: usize,
    pub experimental_wells: usize,
    pub platform_hits: usize,
    pub reporter_hits: usize,
    pub vitality_hits: usize,
    pub patterns: Vec<PatternCount>,
    pub columns: Vec<ColumnSummary>,
}

/// One plate's edge diagnostics, flattened for serialization. `error`
/// is set when the detector could not analyze the plate at all;
/// `max_severity` is the worst severity across the plate's metrics.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeSummary {
    pub plate: String,
    pub error: Option<String>,
    pub max_severity: Option<EdgeSeverity>,
    pub reports: Vec<EdgeEffectReport>,
}

/// The full-run report document.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub tool: &'static str,
    pub version: &'static str,
    pub thresholds: ThresholdProfile,
    pub plates: Vec<PlateSummary>,
    pub convergence: Vec<PolishRecord>,
    pub edge: Vec<EdgeSummary>,
    pub warnings: Vec<String>,
    pub wells: Vec<WellReportRow>,
}

impl RunReport {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Assemble the report for one finished run.
pub fn build_report(
    table: &WellTable,
    result: &AnalysisResult,
    edge: Option<&EdgeDiagnostics>,
    profile: &ThresholdProfile,
) -> RunReport {
    RunReport {
        tool: "kira-plateqc",
        version: env!("CARGO_PKG_VERSION"),
        thresholds: profile.clone(),
        plates: plate_summaries(table, result),
        convergence: result.convergence.clone(),
        edge: edge.map(edge_summaries).unwrap_or_default(),
        warnings: result.warnings.clone(),
        wells: well_rows(table, result),
    }
}

fn well_rows(table: &WellTable, result: &AnalysisResult) -> Vec<WellReportRow> {
    let bscore = |column: Option<&Vec<Option<f64>>>, i: usize| -> Option<f64> {
        column.and_then(|c| c[i])
    };
    table
        .wells()
        .iter()
        .enumerate()
        .map(|(i, well)| WellReportRow {
            plate: well.plate.clone(),
            well: well.pos.label(),
            experimental: well.experimental,
            r1_signal: well.r1_signal,
            r1_viability: well.r1_viability,
            r2_signal: well.r2_signal,
            r2_viability: well.r2_viability,
            od_wt: well.od_wt,
            od_tolc: well.od_tolc,
            od_sa: well.od_sa,
            ratio_r1: result.ratios.r1[i],
            ratio_r2: result.ratios.r2[i],
            norm_wt: result.normalized.wt[i],
            norm_tolc: result.normalized.tolc[i],
            norm_sa: result.normalized.sa[i],
            zscore_r1: result.zscores.r1[i],
            zscore_r2: result.zscores.r2[i],
            bscore_r1: bscore(result.bscores.as_ref().map(|b| &b.r1), i),
            bscore_r2: bscore(result.bscores.as_ref().map(|b| &b.r2), i),
            viable_r1: result.viability.r1[i],
            viable_r2: result.viability.r2[i],
            growth_wt: result.vitality.growth_wt[i],
            growth_tolc: result.vitality.growth_tolc[i],
            growth_sa: result.vitality.growth_sa[i],
            vitality_pattern: result.vitality.pattern[i],
            r1_hit: result.hits.r1_hit[i],
            r2_hit: result.hits.r2_hit[i],
            reporter_hit: result.hits.reporter_hit[i],
            vitality_hit: result.hits.vitality_hit[i],
            platform_hit: result.hits.platform_hit[i],
            confidence: result.hits.confidence.as_ref().and_then(|c| c[i]),
        })
        .collect()
}

fn plate_summaries(table: &WellTable, result: &AnalysisResult) -> Vec<PlateSummary> {
    let wells = table.wells();
    table
        .plate_indices()
        .into_iter()
        .map(|(plate, indices)| {
            let count_flags = |flags: &[bool]| indices.iter().filter(|&&i| flags[i]).count();
            let patterns = pattern_order()
                .iter()
                .map(|&pattern| PatternCount {
                    pattern,
                    count: indices
                        .iter()
                        .filter(|&&i| result.vitality.pattern[i] == pattern)
                        .count(),
                })
                .collect();
            let mut columns = vec![
                column_summary("ratio_r1", &result.ratios.r1, &indices),
                column_summary("ratio_r2", &result.ratios.r2, &indices),
                column_summary("zscore_r1", &result.zscores.r1, &indices),
                column_summary("zscore_r2", &result.zscores.r2, &indices),
            ];
            if let Some(bscores) = &result.bscores {
                columns.push(column_summary("bscore_r1", &bscores.r1, &indices));
                columns.push(column_summary("bscore_r2", &bscores.r2, &indices));
            }
            PlateSummary {
                plate: plate.to_string(),
                wells: indices.len(),
                experimental_wells: indices
                    .iter()
                    .filter(|&&i| wells[i].experimental)
                    .count(),
                platform_hits: count_flags(&result.hits.platform_hit),
                reporter_hits: count_flags(&result.hits.reporter_hit),
                vitality_hits: count_flags(&result.hits.vitality_hit),
                patterns,
                columns,
            }
        })
        .collect()
}

fn column_summary(name: &'static str, values: &[Option<f64>], indices: &[usize]) -> ColumnSummary {
    let subset: Vec<Option<f64>> = indices.iter().map(|&i| values[i]).collect();
    ColumnSummary {
        name,
        stats: stats::summary(&subset),
    }
}

fn edge_summaries(diagnostics: &EdgeDiagnostics) -> Vec<EdgeSummary> {
    diagnostics
        .plates
        .iter()
        .map(|slot| match &slot.outcome {
            Ok(reports) => EdgeSummary {
                plate: slot.plate.clone(),
                error: None,
                max_severity: reports.iter().map(|r| r.severity).max(),
                reports: reports.clone(),
            },
            Err(err) => EdgeSummary {
                plate: slot.plate.clone(),
                error: Some(err.to_string()),
                max_severity: None,
                reports: Vec::new(),
            },
        })
        .collect()
}

pub(crate) fn format_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}"),
        None => "na".to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/report.rs"]
mod tests;
