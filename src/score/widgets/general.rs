//! General security signals: mixed content, outdated Apache, P3P.

use crate::score::level::SeverityLevel;
use crate::score::report::{sort_severe_first, truncate_item, Problem, WidgetReport};
use crate::score::snapshot::{InclusionKind, PageSnapshot};

const APACHE_MARKER: &str = "Apache/";

/// Has no plot. Produces nothing when `warn_security` is off.
pub fn classify(snapshot: &PageSnapshot, warn_security: bool) -> WidgetReport {
    let mut problems = Vec::new();
    if !warn_security {
        return WidgetReport {
            plot: None,
            problems,
        };
    }

    if !snapshot.mixed_content.is_empty() {
        let scripted = snapshot
            .mixed_content
            .iter()
            .any(|inc| inc.kind == InclusionKind::Script);
        let (level, message) = if scripted {
            (SeverityLevel::Severe, "This HTTPS page requests unprotected HTTP scripts")
        } else {
            (SeverityLevel::Warning, "This HTTPS page requests unprotected HTTP resources")
        };

        let items = snapshot
            .mixed_content
            .iter()
            .filter_map(|inc| match inc.kind {
                InclusionKind::Script => Some(format!("A script resource, loaded from {}", truncate_item(&inc.url))),
                InclusionKind::Image => Some(format!("An image resource, loaded from {}", truncate_item(&inc.url))),
                InclusionKind::Other => None,
            })
            .collect();

        problems.push(Problem::new(
            message,
            level,
            format!(
                "The following unsafe resources are loaded into the page ({}):",
                snapshot.mixed_content.len()
            ),
            items,
        ));
    }

    if let Some(server) = snapshot.server.as_deref().filter(|s| s.contains(APACHE_MARKER)) {
        let outdated = apache_version(server).is_some_and(|v| v < 2.2);
        let problem = if outdated {
            Problem::new(
                "The website is hosted on a known outdated server",
                SeverityLevel::Severe,
                "The following vulnerable server version is being used on this page:",
                vec![truncate_item(server)],
            )
        } else {
            Problem::new(
                "The website discloses its Apache server version",
                SeverityLevel::Warning,
                "The following server version is being advertised by this page:",
                vec![truncate_item(server)],
            )
        };
        problems.push(problem);
    }

    sort_severe_first(&mut problems);

    // Good-only entry, appended after sorting.
    if let Some(p3p) = snapshot.p3p.as_deref() {
        problems.push(Problem::new(
            "This site has a published P3P policy",
            SeverityLevel::Good,
            "The following P3P information is present by the website:",
            vec![truncate_item(p3p)],
        ));
    }

    WidgetReport {
        plot: None,
        problems,
    }
}

/// Leading decimal number after `Apache/`, e.g. `2.4` from
/// `Apache/2.4.41 (Ubuntu)`.
fn apache_version(server: &str) -> Option<f64> {
    let (_, rest) = server.split_once(APACHE_MARKER)?;
    let token = rest.split(' ').next().unwrap_or_default();

    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in token.char_indices() {
        if c.is_ascii_digit() {
            end = i + 1;
        } else if c == '.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
    }
    token[..end].parse().ok()
}
