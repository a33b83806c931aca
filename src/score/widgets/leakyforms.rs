//! Forms leaking their inputs: third-party targets, plain HTTP, GET
//! submission and insecure passwords.

use crate::score::benchmark::CategoryBenchmarks;
use crate::score::level::SeverityLevel;
use crate::score::policy::WidgetPolicy;
use crate::score::report::{sort_severe_first, truncate_item, Problem, WidgetReport};
use crate::score::snapshot::{FormMethod, FormObservation, PageSnapshot, Protocol};

use super::build_plot;

pub fn classify(
    snapshot: &PageSnapshot,
    benchmarks: &CategoryBenchmarks,
    policy: &WidgetPolicy,
) -> WidgetReport {
    let forms: Vec<&FormObservation> = snapshot.all_forms().collect();
    let items = forms.iter().map(|form| describe(form)).collect();

    let plot = build_plot(
        "The number of problematic forms on this page",
        &benchmarks.form_count,
        forms.len(),
        policy,
        items,
    );

    let mut problems = Vec::new();
    if policy.issues {
        let third_party: Vec<&FormObservation> =
            forms.iter().copied().filter(|f| f.third_party).collect();
        let http: Vec<&FormObservation> = forms
            .iter()
            .copied()
            .filter(|f| f.protocol == Protocol::Http)
            .collect();
        let get: Vec<&FormObservation> = forms
            .iter()
            .copied()
            .filter(|f| f.method == FormMethod::Get)
            .collect();
        let password: Vec<&FormObservation> =
            forms.iter().copied().filter(|f| f.has_password).collect();

        if !third_party.is_empty() {
            let severe = third_party
                .iter()
                .any(|f| f.has_many_inputs() && f.has_known_action());
            problems.push(form_problem(
                &third_party,
                severe,
                "There are third-party forms on this page",
                "There are third-party forms with many inputs on this page",
                "The following forms submit to third parties",
            ));
        }

        if !http.is_empty() {
            let severe = http.iter().any(|f| f.has_many_inputs() && f.has_known_action());
            problems.push(form_problem(
                &http,
                severe,
                "There are unprotected non-HTTPS forms on this page",
                "There are unprotected non-HTTPS forms with many inputs on this page",
                "The following forms submit over insecure HTTP",
            ));
        }

        if !get.is_empty() {
            let severe = get.iter().any(|f| f.has_many_inputs());
            problems.push(form_problem(
                &get,
                severe,
                "There are leaky GET forms on this page",
                "There are leaky GET forms with many inputs on this page",
                "The following forms submit with leaky HTTP GET",
            ));
        }

        if !password.is_empty() {
            problems.push(Problem::new(
                "Passwords on this page are submitted insecurely",
                SeverityLevel::Severe,
                format!(
                    "The following forms submit passwords insecurely ({}):",
                    password.len()
                ),
                password.iter().map(|form| describe(form)).collect(),
            ));
        }

        sort_severe_first(&mut problems);
    }

    WidgetReport {
        plot: Some(plot),
        problems,
    }
}

fn form_problem(
    forms: &[&FormObservation],
    severe: bool,
    warning_message: &str,
    severe_message: &str,
    detail: &str,
) -> Problem {
    let (level, message) = if severe {
        (SeverityLevel::Severe, severe_message)
    } else {
        (SeverityLevel::Warning, warning_message)
    };
    Problem::new(
        message,
        level,
        format!("{} ({}):", detail, forms.len()),
        forms.iter().map(|f| truncate_item(&f.action)).collect(),
    )
}

/// `"<action> : GET HTTP Third-Party"` with only the applicable flags.
fn describe(form: &FormObservation) -> String {
    let mut line = format!("{} :", truncate_item(&form.action));
    if form.method == FormMethod::Get {
        line.push_str(" GET");
    }
    if form.protocol == Protocol::Http {
        line.push_str(" HTTP");
    }
    if form.third_party {
        line.push_str(" Third-Party");
    }
    line
}
