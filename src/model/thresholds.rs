use serde::Serialize;

use crate::error::ConfigError;
use crate::model::well::Reporter;

/// Immutable, validated configuration for one analysis run.
///
/// Constructed once (usually from [`ThresholdProfile::default_v1`] plus
/// field overrides), checked with [`ThresholdProfile::validate`], then
/// passed by shared reference to every component. Serialized into the
/// run report so results stay reproducible.
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdProfile {
    /// Viability gate fraction `f`: a well passes when its viability
    /// proxy is >= `f * plate median`. In (0, 1].
    pub viability_fraction: f64,
    /// Global Z-score cutoff for reporter hits.
    pub z_cutoff: f64,
    /// Per-reporter overrides of `z_cutoff`.
    pub z_cutoff_r1: Option<f64>,
    pub z_cutoff_r2: Option<f64>,
    /// Vitality hit rule: tolC growth <= tolc_max, WT growth > wt_min,
    /// SA growth > sa_min. All in (0, 1].
    pub tolc_max: f64,
    pub wt_min: f64,
    pub sa_min: f64,
    /// Strain plate medians below this floor count as degenerate.
    pub vitality_median_floor: f64,
    /// Growth fractions are clipped to this ceiling (5.0 = 500%).
    pub growth_ceiling: f64,
    pub hit_combination: HitCombination,
    pub hit_z_source: ZScoreSource,
    /// Emit the optional [0, 1] hit-confidence column.
    pub confidence: bool,
    pub bscore_enabled: bool,
    pub bscore_max_iter: u32,
    pub bscore_tol: f64,
    /// Edge-effect severity thresholds on |effect size|, strictly
    /// increasing.
    pub edge_info: f64,
    pub edge_warn: f64,
    pub edge_critical: f64,
    /// Corner deviation threshold (in interior-MAD units).
    pub edge_corner: f64,
    /// |Spearman rho| above which a row/column trend is flagged.
    pub edge_trend_rho: f64,
    pub autocorrelation: bool,
    /// Neighbor radius (in well units) for the Moran statistic.
    pub autocorrelation_radius: f64,
}

/// How reporter and vitality hits combine into the platform hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HitCombination {
    And,
    Or,
}

/// Which Z column feeds the reporter-hit rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZScoreSource {
    Robust,
    BScore,
}

impl ThresholdProfile {
    pub fn default_v1() -> Self {
        Self {
            viability_fraction: 0.3,
            z_cutoff: 2.0,
            z_cutoff_r1: None,
            z_cutoff_r2: None,
            tolc_max: 0.8,
            wt_min: 0.8,
            sa_min: 0.8,
            vitality_median_floor: 0.01,
            growth_ceiling: 5.0,
            hit_combination: HitCombination::And,
            hit_z_source: ZScoreSource::Robust,
            confidence: true,
            bscore_enabled: true,
            bscore_max_iter: 10,
            bscore_tol: 1e-6,
            edge_info: 0.5,
            edge_warn: 1.0,
            edge_critical: 2.0,
            edge_corner: 2.0,
            edge_trend_rho: 0.5,
            autocorrelation: false,
            autocorrelation_radius: 2.0,
        }
    }

    /// Looser profile for exploratory screens: OR hit combination and a
    /// lower Z cutoff.
    pub fn exploratory_v1() -> Self {
        let mut base = Self::default_v1();
        base.hit_combination = HitCombination::Or;
        base.z_cutoff = 1.5;
        base
    }

    pub fn z_cutoff_for(&self, reporter: Reporter) -> f64 {
        match reporter {
            Reporter::R1 => self.z_cutoff_r1.unwrap_or(self.z_cutoff),
            Reporter::R2 => self.z_cutoff_r2.unwrap_or(self.z_cutoff),
        }
    }

    /// Fail-fast field validation; the first offending field wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.viability_fraction > 0.0 && self.viability_fraction <= 1.0) {
            return Err(ConfigError::ViabilityFraction(self.viability_fraction));
        }
        if !(self.z_cutoff > 0.0) {
            return Err(ConfigError::ZCutoff {
                reporter: "global",
                value: self.z_cutoff,
            });
        }
        for reporter in Reporter::ALL {
            let value = self.z_cutoff_for(reporter);
            if !(value > 0.0) {
                return Err(ConfigError::ZCutoff {
                    reporter: reporter.label(),
                    value,
                });
            }
        }
        for (name, value) in [
            ("tolc_max", self.tolc_max),
            ("wt_min", self.wt_min),
            ("sa_min", self.sa_min),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::VitalityThreshold { name, value });
            }
        }
        if !(self.vitality_median_floor >= 0.0) {
            return Err(ConfigError::MedianFloor(self.vitality_median_floor));
        }
        if !(self.growth_ceiling > 0.0) {
            return Err(ConfigError::GrowthCeiling(self.growth_ceiling));
        }
        if self.bscore_max_iter == 0 {
            return Err(ConfigError::BScoreIterations);
        }
        if !(self.bscore_tol > 0.0) {
            return Err(ConfigError::BScoreTolerance(self.bscore_tol));
        }
        if !(self.edge_info > 0.0
            && self.edge_info < self.edge_warn
            && self.edge_warn < self.edge_critical)
        {
            return Err(ConfigError::EdgeSeverityOrder {
                info: self.edge_info,
                warn: self.edge_warn,
                critical: self.edge_critical,
            });
        }
        if !(self.edge_corner > 0.0) {
            return Err(ConfigError::EdgeThreshold {
                name: "corner",
                value: self.edge_corner,
            });
        }
        if !(self.edge_trend_rho > 0.0) {
            return Err(ConfigError::EdgeThreshold {
                name: "trend",
                value: self.edge_trend_rho,
            });
        }
        if !(self.autocorrelation_radius > 0.0) {
            return Err(ConfigError::AutocorrelationRadius(self.autocorrelation_radius));
        }
        if self.hit_z_source == ZScoreSource::BScore && !self.bscore_enabled {
            return Err(ConfigError::HitSourceNeedsBScore);
        }
        Ok(())
    }
}
