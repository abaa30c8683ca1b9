use tracing::{debug, warn};

use crate::model::thresholds::{HitCombination, ThresholdProfile, ZScoreSource};
use crate::model::well::Reporter;
use crate::pipeline::stage3_zscore::ZScoreColumns;
use crate::pipeline::stage4_viability::ViabilityColumns;
use crate::pipeline::stage5_vitality::VitalityColumns;
use crate::pipeline::BScoreColumns;
use crate::stats;

/// Everything the hit caller reads. All columns are in table order;
/// none of them are modified.
#[derive(Debug, Clone, Copy)]
pub struct HitInputs<'a> {
    pub zscores: &'a ZScoreColumns,
    pub bscores: Option<&'a BScoreColumns>,
    pub viability: &'a ViabilityColumns,
    pub vitality: &'a VitalityColumns,
    pub profile: &'a ThresholdProfile,
}

/// Stage 6 output: per-reporter hit flags, the combined reporter and
/// vitality verdicts, the platform verdict, and the optional
/// confidence column, in table order.
#[derive(Debug, Clone)]
pub struct HitColumns {
    pub r1_hit: Vec<bool>,
    pub r2_hit: Vec<bool>,
    pub reporter_hit: Vec<bool>,
    pub vitality_hit: Vec<bool>,
    pub platform_hit: Vec<bool>,
    pub confidence: Option<Vec<Option<f64>>>,
}

pub fn run_stage6(inputs: &HitInputs<'_>) -> HitColumns {
    let r1_hit = reporter_hits(inputs, Reporter::R1);
    let r2_hit = reporter_hits(inputs, Reporter::R2);
    let reporter_hit: Vec<bool> = r1_hit
        .iter()
        .zip(&r2_hit)
        .map(|(a, b)| *a || *b)
        .collect();
    let vitality_hit = inputs.vitality.hit.clone();
    let platform_hit = combine_hits(&reporter_hit, &vitality_hit, inputs.profile.hit_combination);
    let confidence = confidence_column(inputs);
    debug!(
        reporter_hits = reporter_hit.iter().filter(|h| **h).count(),
        vitality_hits = vitality_hit.iter().filter(|h| **h).count(),
        platform_hits = platform_hit.iter().filter(|h| **h).count(),
        "called hits"
    );
    HitColumns {
        r1_hit,
        r2_hit,
        reporter_hit,
        vitality_hit,
        platform_hit,
        confidence,
    }
}

/// Combines the reporter and vitality verdicts into the platform hit.
/// Exposed on its own so the last stage can be rerun against fixed
/// earlier-stage output.
pub fn combine_hits(
    reporter_hit: &[bool],
    vitality_hit: &[bool],
    combination: HitCombination,
) -> Vec<bool> {
    reporter_hit
        .iter()
        .zip(vitality_hit)
        .map(|(r, v)| match combination {
            HitCombination::And => *r && *v,
            HitCombination::Or => *r || *v,
        })
        .collect()
}

/// One reporter's hit flags: at or above the reporter's Z cutoff and
/// past the viability gate. A missing score is never a hit.
pub fn reporter_hits(inputs: &HitInputs<'_>, reporter: Reporter) -> Vec<bool> {
    let cutoff = inputs.profile.z_cutoff_for(reporter);
    let viable = inputs.viability.get(reporter);
    match z_column(inputs, reporter) {
        Some(scores) => scores
            .iter()
            .zip(viable)
            .map(|(z, ok)| *ok && z.is_some_and(|z| z >= cutoff))
            .collect(),
        None => {
            warn!(
                reporter = reporter.label(),
                "B-score column unavailable; reporter hits fail closed"
            );
            vec![false; viable.len()]
        }
    }
}

fn z_column<'a>(inputs: &HitInputs<'a>, reporter: Reporter) -> Option<&'a [Option<f64>]> {
    match inputs.profile.hit_z_source {
        ZScoreSource::Robust => Some(inputs.zscores.get(reporter)),
        ZScoreSource::BScore => inputs.bscores.map(|b| b.get(reporter)),
    }
}

/// Confidence is a ranking aid, not a probability: half the weight on
/// the strongest reporter score (saturating at twice its cutoff), half
/// on how far tolC growth sits below its ceiling. Missing either
/// ingredient leaves the well unranked.
fn confidence_column(inputs: &HitInputs<'_>) -> Option<Vec<Option<f64>>> {
    if !inputs.profile.confidence {
        return None;
    }
    let n = inputs.vitality.hit.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let z_part = Reporter::ALL
            .iter()
            .filter_map(|&reporter| {
                let z = z_column(inputs, reporter).and_then(|scores| scores[i])?;
                let cutoff = inputs.profile.z_cutoff_for(reporter);
                Some(stats::clip01(z / (2.0 * cutoff)))
            })
            .fold(None, |best: Option<f64>, part| {
                Some(best.map_or(part, |b| b.max(part)))
            });
        let tolc_part = inputs.vitality.growth_tolc[i].map(|g| {
            stats::clip01((inputs.profile.tolc_max - g) / inputs.profile.tolc_max)
        });
        out.push(match (z_part, tolc_part) {
            (Some(z), Some(t)) => Some(stats::clip01(0.5 * z + 0.5 * t)),
            _ => None,
        });
    }
    Some(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_hits.rs"]
mod tests;
