//! User policy controlling how each widget classifies.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::classify::EngineKind;
use super::level::SeverityLevel;

// == Widget Policy ==
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetPolicy {
    /// Benchmark classifier
    pub engine: EngineKind,
    /// Level assigned to unremarkable values; `None` means good
    pub baseline: Option<SeverityLevel>,
    /// Whether secondary problems are computed
    pub issues: bool,
}

impl Default for WidgetPolicy {
    fn default() -> Self {
        Self {
            engine: EngineKind::Sigma,
            baseline: Some(SeverityLevel::Good),
            issues: true,
        }
    }
}

// == Policy ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub trackers: WidgetPolicy,
    pub fingerprinting: WidgetPolicy,
    pub thirdparties: WidgetPolicy,
    pub leakyforms: WidgetPolicy,
    /// Crowdsourced report submission opt-in
    pub reporting: bool,
    /// General security warnings (mixed content, server version, P3P)
    pub warn_security: bool,
    /// Highlighting of leaky forms inside pages
    pub mark_forms: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            trackers: WidgetPolicy::default(),
            fingerprinting: WidgetPolicy::default(),
            thirdparties: WidgetPolicy::default(),
            leakyforms: WidgetPolicy::default(),
            reporting: true,
            warn_security: true,
            mark_forms: true,
        }
    }
}

const WIDGETS: [&str; 4] = ["trackers", "fingerprinting", "thirdparties", "leakyforms"];

impl Policy {
    // == From Flat ==
    /// Builds a policy from the flat options map
    /// (`trackers_engine`, `trackers_baseline`, `trackers_issues`, ...,
    /// `crowdsourcing`, `warn_security`, `mark_forms`).
    ///
    /// Missing or unrecognised values keep their defaults.
    pub fn from_flat(options: &Map<String, Value>) -> Self {
        let mut policy = Policy::default();

        for name in WIDGETS {
            let widget = policy.widget_mut(name);
            if let Some(engine) = options
                .get(&format!("{}_engine", name))
                .and_then(Value::as_str)
                .and_then(EngineKind::parse)
            {
                widget.engine = engine;
            }
            if let Some(baseline) = options
                .get(&format!("{}_baseline", name))
                .and_then(Value::as_str)
                .and_then(SeverityLevel::parse)
            {
                widget.baseline = Some(baseline);
            }
            if let Some(issues) = options.get(&format!("{}_issues", name)).and_then(Value::as_bool) {
                widget.issues = issues;
            }
        }

        if let Some(v) = options.get("crowdsourcing").and_then(Value::as_bool) {
            policy.reporting = v;
        }
        if let Some(v) = options.get("warn_security").and_then(Value::as_bool) {
            policy.warn_security = v;
        }
        if let Some(v) = options.get("mark_forms").and_then(Value::as_bool) {
            policy.mark_forms = v;
        }

        policy
    }

    // == To Flat ==
    /// Inverse of [`from_flat`](Self::from_flat).
    pub fn to_flat(&self) -> Map<String, Value> {
        let mut options = Map::new();

        for name in WIDGETS {
            let widget = self.widget(name);
            let engine = match widget.engine {
                EngineKind::Sigma => "sigma",
                EngineKind::Quartile => "quartile",
            };
            options.insert(format!("{}_engine", name), Value::from(engine));
            options.insert(
                format!("{}_baseline", name),
                widget
                    .baseline
                    .map_or(Value::Null, |level| Value::from(level.as_str())),
            );
            options.insert(format!("{}_issues", name), Value::from(widget.issues));
        }

        options.insert("crowdsourcing".to_string(), Value::from(self.reporting));
        options.insert("warn_security".to_string(), Value::from(self.warn_security));
        options.insert("mark_forms".to_string(), Value::from(self.mark_forms));
        options
    }

    fn widget(&self, name: &str) -> &WidgetPolicy {
        match name {
            "trackers" => &self.trackers,
            "fingerprinting" => &self.fingerprinting,
            "thirdparties" => &self.thirdparties,
            _ => &self.leakyforms,
        }
    }

    fn widget_mut(&mut self, name: &str) -> &mut WidgetPolicy {
        match name {
            "trackers" => &mut self.trackers,
            "fingerprinting" => &mut self.fingerprinting,
            "thirdparties" => &mut self.thirdparties,
            _ => &mut self.leakyforms,
        }
    }
}
