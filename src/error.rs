use thiserror::Error;

/// Structural problems with the input table or a well position.
///
/// These fire at the boundary where the bad input is first seen and are never
/// raised for numeric degeneracy; degenerate statistics yield missing values
/// instead (see the `stats` module contract).
#[derive(Debug, Error)]
pub enum TableError {
    #[error("well table is empty")]
    Empty,
    #[error("plate {plate}: duplicate well {well}")]
    DuplicateWell { plate: String, well: String },
    #[error("plate {plate}: well {well} does not fit the {rows}x{cols} layout")]
    OutsideLayout {
        plate: String,
        well: String,
        rows: usize,
        cols: usize,
    },
    #[error("no standard plate layout fits well {well}")]
    NoLayoutFits { well: String },
    #[error("invalid well position {input:?}: {reason}")]
    BadPosition { input: String, reason: &'static str },
}

/// Out-of-range values in a [`ThresholdProfile`](crate::model::thresholds::ThresholdProfile).
///
/// Validation is fail-fast: the first offending field is reported and the
/// profile is rejected before any analysis runs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("viability fraction must be in (0, 1], got {0}")]
    ViabilityFraction(f64),
    #[error("z-score cutoff for {reporter} must be > 0, got {value}")]
    ZCutoff { reporter: &'static str, value: f64 },
    #[error("vitality threshold {name} must be in (0, 1], got {value}")]
    VitalityThreshold { name: &'static str, value: f64 },
    #[error("vitality median floor must be >= 0, got {0}")]
    MedianFloor(f64),
    #[error("vitality growth ceiling must be > 0, got {0}")]
    GrowthCeiling(f64),
    #[error("b-score max iterations must be > 0")]
    BScoreIterations,
    #[error("b-score tolerance must be > 0, got {0}")]
    BScoreTolerance(f64),
    #[error("edge severity thresholds must be positive and strictly increasing, got {info}/{warn}/{critical}")]
    EdgeSeverityOrder { info: f64, warn: f64, critical: f64 },
    #[error("edge {name} threshold must be > 0, got {value}")]
    EdgeThreshold { name: &'static str, value: f64 },
    #[error("spatial autocorrelation radius must be > 0, got {0}")]
    AutocorrelationRadius(f64),
    #[error("hit z-source is b-score but b-scoring is disabled")]
    HitSourceNeedsBScore,
}

/// Failure while building or analyzing one plate's matrix.
///
/// Recorded against that plate's result slot; other plates keep going.
#[derive(Debug, Error)]
pub enum PlateError {
    #[error("plate {plate}: no valid data in any analyzed metric")]
    NoData { plate: String },
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Top-level failure of a full analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Table(#[from] TableError),
}
