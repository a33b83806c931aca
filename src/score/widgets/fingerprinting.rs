//! Fingerprinting API breadth and call volume.

use crate::score::benchmark::CategoryBenchmarks;
use crate::score::level::SeverityLevel;
use crate::score::policy::WidgetPolicy;
use crate::score::report::{sort_severe_first, Problem, WidgetReport};
use crate::score::snapshot::PageSnapshot;

use super::build_plot;

pub fn classify(
    snapshot: &PageSnapshot,
    benchmarks: &CategoryBenchmarks,
    policy: &WidgetPolicy,
) -> WidgetReport {
    let items = calls_by_volume(snapshot);
    let plot = build_plot(
        "The number of fingerprinting APIs called",
        &benchmarks.fapi_cardinality,
        snapshot.fingerprinting_calls.len(),
        policy,
        items.clone(),
    );

    let mut problems = Vec::new();
    if policy.issues {
        let total = snapshot.total_fingerprinting_calls();
        let level = policy
            .engine
            .classify(&benchmarks.fapi_raw_count, total as f64, policy.baseline);

        let message = match level {
            SeverityLevel::Warning => Some("This website queries information about your browser considerably"),
            SeverityLevel::Severe => Some("This website queries information about your browser extensively"),
            _ => None,
        };
        if let Some(message) = message {
            let detail = format!("This website called fingerprinting APIs more than {} times:", total);
            problems.push(Problem::new(message, level, detail, items));
        }
        sort_severe_first(&mut problems);
    }

    WidgetReport {
        plot: Some(plot),
        problems,
    }
}

/// `"<api> : <n> calls"`, most called first, ties by name.
fn calls_by_volume(snapshot: &PageSnapshot) -> Vec<String> {
    let mut calls: Vec<(&String, &u64)> = snapshot.fingerprinting_calls.iter().collect();
    calls.sort_by(|a, b| b.1.cmp(a.1));
    calls
        .into_iter()
        .map(|(api, count)| format!("{} : {} calls", api, count))
        .collect()
}
