pub mod patterns;
pub mod plate;
pub mod severity;
pub mod thresholds;
pub mod well;
