//! Code coverage summary model.

use serde::{Deserialize, Serialize};

/// Coverage percentages for one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub service_id: String,
    pub statements: f64,
    pub branches: f64,
    pub functions: f64,
    pub lines: f64,
}

impl CoverageSummary {
    /// `(kind, percent)` pairs in emission order.
    pub fn kinds(&self) -> [(&'static str, f64); 4] {
        [
            ("statements", self.statements),
            ("branches", self.branches),
            ("functions", self.functions),
            ("lines", self.lines),
        ]
    }
}

/// Istanbul `coverage-summary.json` document.
#[derive(Debug, Deserialize)]
pub struct CoverageDocument {
    pub total: CoverageTotals,
}

/// The `total` object of a coverage summary.
#[derive(Debug, Default, Deserialize)]
pub struct CoverageTotals {
    #[serde(default)]
    pub statements: CoverageMetric,
    #[serde(default)]
    pub branches: CoverageMetric,
    #[serde(default)]
    pub functions: CoverageMetric,
    #[serde(default)]
    pub lines: CoverageMetric,
}

/// One coverage dimension. Istanbul writes `"Unknown"` for `pct` when nothing was instrumented.
#[derive(Debug, Default, Deserialize)]
pub struct CoverageMetric {
    #[serde(default)]
    pub pct: serde_json::Value,
}

impl CoverageMetric {
    pub fn percent(&self) -> f64 {
        self.pct.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}
