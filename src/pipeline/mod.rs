//! The staged analysis pipeline.
//!
//! Stages run in a fixed order and only ever append derived columns;
//! no stage rewrites raw data or another stage's output. Every
//! statistic is scoped to a single plate, so plates cannot contaminate
//! each other, and reruns over the same table and thresholds produce
//! bit-identical columns.

pub mod stage1_ratios;
pub mod stage2_normalize;
pub mod stage3_zscore;
pub mod stage4_viability;
pub mod stage5_vitality;
pub mod stage6_hits;

use tracing::info;

use crate::bscore::cache::BScoreCache;
use crate::bscore::{self, PolishRecord};
use crate::error::AnalysisError;
use crate::model::thresholds::ThresholdProfile;
use crate::model::well::{Reporter, WellTable};
use crate::pipeline::stage1_ratios::{run_stage1, RatioColumns};
use crate::pipeline::stage2_normalize::{run_stage2, NormalizedColumns};
use crate::pipeline::stage3_zscore::{run_stage3, ZScoreColumns};
use crate::pipeline::stage4_viability::{run_stage4, ViabilityColumns};
use crate::pipeline::stage5_vitality::{run_stage5, VitalityColumns};
use crate::pipeline::stage6_hits::{run_stage6, HitColumns, HitInputs};

/// Per-reporter B-score columns, in table order.
#[derive(Debug, Clone)]
pub struct BScoreColumns {
    pub r1: Vec<Option<f64>>,
    pub r2: Vec<Option<f64>>,
}

impl BScoreColumns {
    pub fn get(&self, reporter: Reporter) -> &[Option<f64>] {
        match reporter {
            Reporter::R1 => &self.r1,
            Reporter::R2 => &self.r2,
        }
    }
}

/// Everything one run derives from a well table. All columns are in
/// table order and never reorder or drop rows.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub ratios: RatioColumns,
    pub normalized: NormalizedColumns,
    pub zscores: ZScoreColumns,
    pub bscores: Option<BScoreColumns>,
    pub convergence: Vec<PolishRecord>,
    pub viability: ViabilityColumns,
    pub vitality: VitalityColumns,
    pub hits: HitColumns,
    pub warnings: Vec<String>,
}

impl AnalysisResult {
    /// Score columns worth screening for spatial artifacts.
    pub fn edge_metrics(&self) -> Vec<(&'static str, &[Option<f64>])> {
        let mut metrics = vec![
            ("zscore_r1", self.zscores.r1.as_slice()),
            ("zscore_r2", self.zscores.r2.as_slice()),
        ];
        if let Some(bscores) = &self.bscores {
            metrics.push(("bscore_r1", bscores.r1.as_slice()));
            metrics.push(("bscore_r2", bscores.r2.as_slice()));
        }
        metrics
    }
}

/// Run every stage over the table with the given thresholds.
pub fn run_analysis(
    table: &WellTable,
    profile: &ThresholdProfile,
) -> Result<AnalysisResult, AnalysisError> {
    run_analysis_inner(table, profile, None)
}

/// Same as [`run_analysis`], but reuses median-polish fits from the
/// cache when the same plate content comes around again.
pub fn run_analysis_with_cache(
    table: &WellTable,
    profile: &ThresholdProfile,
    cache: &BScoreCache,
) -> Result<AnalysisResult, AnalysisError> {
    run_analysis_inner(table, profile, Some(cache))
}

fn run_analysis_inner(
    table: &WellTable,
    profile: &ThresholdProfile,
    cache: Option<&BScoreCache>,
) -> Result<AnalysisResult, AnalysisError> {
    profile.validate()?;
    info!(
        wells = table.len(),
        plates = table.plate_ids().len(),
        "starting plate analysis"
    );

    let mut warnings = Vec::new();
    let ratios = run_stage1(table);
    let normalized = run_stage2(table, &mut warnings);
    let zscores = run_stage3(table, &ratios, &mut warnings);

    let (bscores, convergence) = if profile.bscore_enabled {
        let (r1, mut records) = reporter_bscores(table, &ratios, Reporter::R1, profile, cache);
        let (r2, r2_records) = reporter_bscores(table, &ratios, Reporter::R2, profile, cache);
        records.extend(r2_records);
        for record in &records {
            if !record.converged {
                warnings.push(format!(
                    "plate {}: median polish of {} stopped at the iteration cap \
                     ({} iterations, max delta {:.3e})",
                    record.plate, record.metric, record.iterations, record.max_delta
                ));
            }
        }
        (Some(BScoreColumns { r1, r2 }), records)
    } else {
        (None, Vec::new())
    };

    let viability = run_stage4(table, profile, &mut warnings);
    let vitality = run_stage5(table, profile, &mut warnings);
    let hits = run_stage6(&HitInputs {
        zscores: &zscores,
        bscores: bscores.as_ref(),
        viability: &viability,
        vitality: &vitality,
        profile,
    });

    info!(
        platform_hits = hits.platform_hit.iter().filter(|h| **h).count(),
        warnings = warnings.len(),
        "analysis complete"
    );
    Ok(AnalysisResult {
        ratios,
        normalized,
        zscores,
        bscores,
        convergence,
        viability,
        vitality,
        hits,
        warnings,
    })
}

fn reporter_bscores(
    table: &WellTable,
    ratios: &RatioColumns,
    reporter: Reporter,
    profile: &ThresholdProfile,
    cache: Option<&BScoreCache>,
) -> (Vec<Option<f64>>, Vec<PolishRecord>) {
    let metric = format!("ratio_{}", reporter.label());
    let values = ratios.get(reporter);
    match cache {
        Some(cache) => bscore::bscore_column_with_cache(
            table,
            &metric,
            values,
            profile.bscore_max_iter,
            profile.bscore_tol,
            cache,
        ),
        None => bscore::bscore_column(
            table,
            &metric,
            values,
            profile.bscore_max_iter,
            profile.bscore_tol,
        ),
    }
}
