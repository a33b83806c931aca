//! Report types produced by the score engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::benchmark::BenchmarkStat;
use super::level::SeverityLevel;

/// Longest text kept for a single listed item.
pub const ITEM_MAX_LEN: usize = 50;

/// Truncates `text` to [`ITEM_MAX_LEN`] characters.
pub fn truncate_item(text: &str) -> String {
    text.chars().take(ITEM_MAX_LEN).collect()
}

// == Plot ==
/// A widget's main metric compared with its benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plot {
    pub benchmark: BenchmarkStat,
    pub current_value: u64,
    pub level: SeverityLevel,
    pub summary: String,
    pub items: Vec<String>,
}

// == Problem ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub message: String,
    pub level: SeverityLevel,
    pub detail: String,
    #[serde(default)]
    pub items: Vec<String>,
}

impl Problem {
    pub fn new(
        message: impl Into<String>,
        level: SeverityLevel,
        detail: impl Into<String>,
        items: Vec<String>,
    ) -> Self {
        Self {
            message: message.into(),
            level,
            detail: detail.into(),
            items,
        }
    }
}

/// Stable sort putting severe problems first.
pub fn sort_severe_first(problems: &mut [Problem]) {
    problems.sort_by_key(|p| p.level != SeverityLevel::Severe);
}

// == Widget Report ==
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WidgetReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<Plot>,
    pub problems: Vec<Problem>,
}

impl WidgetReport {
    /// Every level the widget contributes, plot first.
    pub fn levels(&self) -> impl Iterator<Item = SeverityLevel> + '_ {
        self.plot
            .iter()
            .map(|plot| plot.level)
            .chain(self.problems.iter().map(|p| p.level))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WidgetReports {
    pub trackers: WidgetReport,
    pub fingerprinting: WidgetReport,
    pub thirdparties: WidgetReport,
    pub leakyforms: WidgetReport,
    pub general: WidgetReport,
}

impl WidgetReports {
    pub fn iter(&self) -> impl Iterator<Item = &WidgetReport> {
        [
            &self.trackers,
            &self.fingerprinting,
            &self.thirdparties,
            &self.leakyforms,
            &self.general,
        ]
        .into_iter()
    }
}

// == Category Report ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub widgets: WidgetReports,
    pub worst_level: SeverityLevel,
    pub issue_count: u32,
}

impl CategoryReport {
    /// Aggregates the widgets: the most severe level and the number of
    /// warning or severe contributions.
    pub fn from_widgets(widgets: WidgetReports) -> Self {
        let mut worst_level = SeverityLevel::Good;
        let mut issue_count = 0;

        for level in widgets.iter().flat_map(WidgetReport::levels) {
            worst_level = worst_level.worse(level);
            if level.is_issue() {
                issue_count += 1;
            }
        }

        Self {
            widgets,
            worst_level,
            issue_count,
        }
    }
}

// == Classification Report ==
/// Per-category reports plus a mirror of the selected category's totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub category: String,
    pub worst_level: SeverityLevel,
    pub issue_count: u32,
    pub categories: BTreeMap<String, CategoryReport>,
}

impl ClassificationReport {
    /// Selects `category` for the top level. An unknown category yields an
    /// unknown level with no issues.
    pub fn new(category: impl Into<String>, categories: BTreeMap<String, CategoryReport>) -> Self {
        let category = category.into();
        let (worst_level, issue_count) = categories
            .get(&category)
            .map_or((SeverityLevel::Unknown, 0), |report| {
                (report.worst_level, report.issue_count)
            });

        Self {
            category,
            worst_level,
            issue_count,
            categories,
        }
    }

    pub fn selected(&self) -> Option<&CategoryReport> {
        self.categories.get(&self.category)
    }
}
