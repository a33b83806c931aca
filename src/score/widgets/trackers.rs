//! Tracker count, tracker location and tracker reputation.

use crate::score::benchmark::CategoryBenchmarks;
use crate::score::classify::threshold;
use crate::score::level::SeverityLevel;
use crate::score::policy::WidgetPolicy;
use crate::score::report::{sort_severe_first, truncate_item, Problem, WidgetReport};
use crate::score::snapshot::PageSnapshot;

use super::build_plot;

pub fn classify(
    snapshot: &PageSnapshot,
    benchmarks: &CategoryBenchmarks,
    policy: &WidgetPolicy,
) -> WidgetReport {
    let domains: Vec<String> = snapshot.trackers.keys().cloned().collect();
    let plot = build_plot(
        "The number of trackers on this page",
        &benchmarks.tracker_count,
        domains.len(),
        policy,
        domains,
    );

    let mut problems = Vec::new();
    if policy.issues {
        problems.extend(foreign_trackers(snapshot));
        problems.extend(low_reputation_trackers(snapshot));
        sort_severe_first(&mut problems);
    }

    WidgetReport {
        plot: Some(plot),
        problems,
    }
}

/// Trackers located in another country than the page's server. Trackers or
/// servers without a resolved country are not compared.
fn foreign_trackers(snapshot: &PageSnapshot) -> Option<Problem> {
    let server_country = snapshot.server_country.as_deref();

    let items: Vec<String> = snapshot
        .trackers
        .values()
        .filter_map(|tracker| {
            let country = tracker.country.as_deref()?;
            match server_country {
                Some(server) if server != country => {
                    Some(format!("{} from {}", truncate_item(&tracker.domain), country))
                }
                _ => None,
            }
        })
        .collect();

    let level = threshold(0.0, 1.0, f64::INFINITY, items.len() as f64);
    let message = match level {
        SeverityLevel::Warning => "There are international trackers on this page",
        SeverityLevel::Severe => "There are many international trackers on this page",
        _ => return None,
    };

    let detail = format!(
        "The webpage you are visiting originates from {}. The following foreign trackers are present on this page ({}):",
        server_country.unwrap_or_default(),
        items.len()
    );
    Some(Problem::new(message, level, detail, items))
}

fn low_reputation_trackers(snapshot: &PageSnapshot) -> Option<Problem> {
    let items: Vec<String> = snapshot
        .trackers
        .values()
        .filter(|tracker| tracker.reputation.as_ref().is_some_and(|r| r.is_low()))
        .map(|tracker| truncate_item(&tracker.domain))
        .collect();

    let level = threshold(0.0, 0.0, f64::INFINITY, items.len() as f64);
    if level == SeverityLevel::Good {
        return None;
    }

    let detail = format!(
        "The following low-reputable trackers are present on this page ({}):",
        items.len()
    );
    Some(Problem::new(
        "There are trackers with low reputation on this page",
        level,
        detail,
        items,
    ))
}
