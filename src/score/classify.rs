//! Classifier primitives comparing one observed value to a benchmark.

use serde::{Deserialize, Serialize};

use super::benchmark::BenchmarkStat;
use super::level::SeverityLevel;

// == Engine Kind ==
/// Benchmark classifier selected per widget by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Sigma,
    Quartile,
}

impl EngineKind {
    pub fn classify(
        self,
        stat: &BenchmarkStat,
        value: f64,
        baseline: Option<SeverityLevel>,
    ) -> SeverityLevel {
        match self {
            EngineKind::Sigma => sigma(stat, value, baseline),
            EngineKind::Quartile => quartile(stat, value, baseline),
        }
    }

    pub fn parse(name: &str) -> Option<EngineKind> {
        match name {
            "sigma" => Some(EngineKind::Sigma),
            "quartile" => Some(EngineKind::Quartile),
            _ => None,
        }
    }
}

/// Below the third quartile: `baseline` (good when unset). Otherwise severe.
pub fn quartile(stat: &BenchmarkStat, value: f64, baseline: Option<SeverityLevel>) -> SeverityLevel {
    if value < stat.q3 {
        baseline.unwrap_or(SeverityLevel::Good)
    } else {
        SeverityLevel::Severe
    }
}

/// Below one standard deviation above the mean: `baseline` (good when unset).
/// Below two: warning, unless the baseline is already severe. Otherwise severe.
pub fn sigma(stat: &BenchmarkStat, value: f64, baseline: Option<SeverityLevel>) -> SeverityLevel {
    if value < stat.mean + stat.sd {
        baseline.unwrap_or(SeverityLevel::Good)
    } else if value < stat.mean + 2.0 * stat.sd {
        if baseline == Some(SeverityLevel::Severe) {
            SeverityLevel::Severe
        } else {
            SeverityLevel::Warning
        }
    } else {
        SeverityLevel::Severe
    }
}

/// Fixed bands: `..=low` good, `..=mid` warning, above `mid` severe.
///
/// `high` bounds the severe band; values beyond it are severe as well.
pub fn threshold(low: f64, mid: f64, high: f64, value: f64) -> SeverityLevel {
    debug_assert!(low <= mid && mid <= high);
    if value <= low {
        SeverityLevel::Good
    } else if value <= mid {
        SeverityLevel::Warning
    } else {
        SeverityLevel::Severe
    }
}
