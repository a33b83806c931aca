//! Third-party iframe count.

use crate::score::benchmark::CategoryBenchmarks;
use crate::score::policy::WidgetPolicy;
use crate::score::report::{truncate_item, WidgetReport};
use crate::score::snapshot::PageSnapshot;

use super::build_plot;

pub fn classify(
    snapshot: &PageSnapshot,
    benchmarks: &CategoryBenchmarks,
    policy: &WidgetPolicy,
) -> WidgetReport {
    let mut urls: Vec<String> = snapshot
        .iframes
        .values()
        .map(|frame| truncate_item(&frame.url))
        .collect();
    urls.sort();

    let plot = build_plot(
        "The number of third-party iframes on this page",
        &benchmarks.tp_iframe_count,
        snapshot.iframes.len(),
        policy,
        urls,
    );

    WidgetReport {
        plot: Some(plot),
        problems: Vec::new(),
    }
}
