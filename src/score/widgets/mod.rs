//! Per-widget classification.
//!
//! Each widget turns one facet of a [`PageSnapshot`](super::snapshot::PageSnapshot)
//! into a [`WidgetReport`](super::report::WidgetReport) against the benchmarks of
//! a single category.

pub mod fingerprinting;
pub mod general;
pub mod leakyforms;
pub mod thirdparties;
pub mod trackers;

use super::benchmark::BenchmarkStat;
use super::policy::WidgetPolicy;
use super::report::Plot;

/// Classifies `value` against `stat` with the widget's engine and builds the
/// plot, e.g. `"The number of trackers on this page is SAFE (3)"`.
pub(crate) fn build_plot(
    subject: &str,
    stat: &BenchmarkStat,
    value: usize,
    policy: &WidgetPolicy,
    items: Vec<String>,
) -> Plot {
    let level = policy.engine.classify(stat, value as f64, policy.baseline);
    Plot {
        benchmark: *stat,
        current_value: value as u64,
        level,
        summary: format!("{} is {} ({})", subject, level.verdict(), value),
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::level::SeverityLevel;

    #[test]
    fn test_build_plot_summary() {
        let stat = BenchmarkStat {
            min: 0.0,
            q1: 1.0,
            median: 2.0,
            q3: 3.0,
            mean: 5.0,
            sd: 2.0,
            max: 20.0,
        };
        let plot = build_plot("The number of things", &stat, 8, &WidgetPolicy::default(), vec![]);
        assert_eq!(plot.level, SeverityLevel::Warning);
        assert_eq!(plot.current_value, 8);
        assert_eq!(plot.summary, "The number of things is CONSIDERABLE (8)");
    }
}
