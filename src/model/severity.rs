use serde::Serialize;

/// Edge-effect severity. Never "none": an analyzable plate always gets
/// at least `Info`. Ordered so callers can compare against a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSeverity {
    Info,
    Warn,
    Critical,
}

impl EdgeSeverity {
    pub fn label(self) -> &'static str {
        match self {
            EdgeSeverity::Info => "info",
            EdgeSeverity::Warn => "warn",
            EdgeSeverity::Critical => "critical",
        }
    }
}
