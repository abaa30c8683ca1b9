//! Deterministic analysis engine for multi-well screening plates.
//!
//! The input is a table of well rows from a dual-reporter antibacterial
//! screen: two reporter signal/viability channels plus growth readouts
//! for three strains. The engine derives reporter ratios, plate-scoped
//! robust Z-scores, median-polish B-scores, viability gates, vitality
//! growth patterns and multi-stage hit calls, and can screen score
//! columns for plate edge artifacts.
//!
//! Everything is append-only and plate-scoped: raw columns are never
//! mutated, each derived column is keyed to the input row order, and no
//! statistic ever mixes wells from different plates. Reruns over the
//! same table and thresholds produce bit-identical output.
//!
//! ```no_run
//! use kira_plateqc::{run_analysis, ThresholdProfile, WellTable};
//!
//! # fn wells() -> Vec<kira_plateqc::WellRecord> { Vec::new() }
//! # fn main() -> Result<(), kira_plateqc::AnalysisError> {
//! let table = WellTable::new(wells())?;
//! let profile = ThresholdProfile::default_v1();
//! let result = run_analysis(&table, &profile)?;
//! let hits = result.hits.platform_hit.iter().filter(|h| **h).count();
//! println!("{hits} platform hits");
//! # Ok(())
//! # }
//! ```

pub mod bscore;
pub mod edge;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use crate::error::{AnalysisError, ConfigError, PlateError, TableError};
pub use crate::model::thresholds::ThresholdProfile;
pub use crate::model::well::{Reporter, Strain, WellPosition, WellRecord, WellTable};
pub use crate::pipeline::{run_analysis, run_analysis_with_cache, AnalysisResult};
