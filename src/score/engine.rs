//! Score Engine Module
//!
//! Pure classification of a page snapshot against every benchmark category.

use std::collections::BTreeMap;

use tracing::debug;

use super::benchmark::{BenchmarkBundle, CategoryBenchmarks};
use super::policy::Policy;
use super::report::{CategoryReport, ClassificationReport, WidgetReports};
use super::snapshot::PageSnapshot;
use super::widgets;

// == Score Engine ==
/// Borrows the benchmarks and policy for the duration of a classification.
#[derive(Debug, Clone, Copy)]
pub struct ScoreEngine<'a> {
    benchmarks: &'a BenchmarkBundle,
    policy: &'a Policy,
}

impl<'a> ScoreEngine<'a> {
    pub fn new(benchmarks: &'a BenchmarkBundle, policy: &'a Policy) -> Self {
        Self { benchmarks, policy }
    }

    // == Classify ==
    /// Scores `snapshot` under every benchmark category. The top level
    /// mirrors `snapshot.category`.
    pub fn classify(&self, snapshot: &PageSnapshot) -> ClassificationReport {
        let categories: BTreeMap<String, CategoryReport> = self
            .benchmarks
            .iter()
            .map(|(name, benchmarks)| (name.clone(), self.classify_category(snapshot, benchmarks)))
            .collect();

        let report = ClassificationReport::new(snapshot.category.clone(), categories);
        debug!(
            category = %report.category,
            worst = %report.worst_level,
            issues = report.issue_count,
            "Snapshot classified"
        );
        report
    }

    fn classify_category(
        &self,
        snapshot: &PageSnapshot,
        benchmarks: &CategoryBenchmarks,
    ) -> CategoryReport {
        let policy = self.policy;
        let widgets = WidgetReports {
            trackers: widgets::trackers::classify(snapshot, benchmarks, &policy.trackers),
            fingerprinting: widgets::fingerprinting::classify(
                snapshot,
                benchmarks,
                &policy.fingerprinting,
            ),
            thirdparties: widgets::thirdparties::classify(snapshot, benchmarks, &policy.thirdparties),
            leakyforms: widgets::leakyforms::classify(snapshot, benchmarks, &policy.leakyforms),
            general: widgets::general::classify(snapshot, policy.warn_security),
        };
        CategoryReport::from_widgets(widgets)
    }
}
