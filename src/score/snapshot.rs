//! Raw per-page observations consumed by the scorer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Action recorded for forms whose target could not be resolved.
pub const UNKNOWN_ACTION: &str = "(unknown)";

/// Category used when the site has no assigned category.
pub const DEFAULT_CATEGORY: &str = "unspecified";

// == Tracker ==
/// Reputation answer for one tracker domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerReputation {
    pub trust_score: i64,
    pub confidence: i64,
}

impl TrackerReputation {
    /// Score below 40 with confidence of at least 10.
    pub fn is_low(&self) -> bool {
        self.trust_score < 40 && self.confidence >= 10
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerObservation {
    pub domain: String,
    pub source_url: String,
    #[serde(default)]
    pub filter_rule_id: String,
    #[serde(default)]
    pub frame_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation: Option<TrackerReputation>,
}

impl TrackerObservation {
    pub fn new(
        domain: impl Into<String>,
        source_url: impl Into<String>,
        filter_rule_id: impl Into<String>,
        frame_id: i64,
    ) -> Self {
        Self {
            domain: domain.into(),
            source_url: source_url.into(),
            filter_rule_id: filter_rule_id.into(),
            frame_id,
            ip: None,
            country: None,
            reputation: None,
        }
    }
}

// == Iframe ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IframeObservation {
    pub url: String,
    pub frame_id: i64,
    pub parent_frame_id: i64,
}

// == Form ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMethod {
    Get,
    Post,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormObservation {
    pub action: String,
    pub method: FormMethod,
    pub protocol: Protocol,
    #[serde(default)]
    pub third_party: bool,
    #[serde(default)]
    pub has_password: bool,
    #[serde(default)]
    pub visible_input_count: u32,
}

impl FormObservation {
    /// More than two visible inputs.
    pub fn has_many_inputs(&self) -> bool {
        self.visible_input_count > 2
    }

    pub fn has_known_action(&self) -> bool {
        self.action != UNKNOWN_ACTION
    }

    /// Sent by GET, over plain HTTP, or to a third party.
    pub fn is_leaky(&self) -> bool {
        self.method == FormMethod::Get || self.protocol == Protocol::Http || self.third_party
    }
}

// == Mixed Content ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionKind {
    Script,
    Image,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedInclusion {
    pub kind: InclusionKind,
    pub url: String,
}

// == Page Snapshot ==
/// Everything observed about one page.
///
/// Ordered maps keep iteration, and so every derived report, deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default = "default_category")]
    pub category: String,
    /// Keyed by registrable tracker domain
    #[serde(default)]
    pub trackers: BTreeMap<String, TrackerObservation>,
    /// Third-party iframes keyed by frame id
    #[serde(default)]
    pub iframes: BTreeMap<i64, IframeObservation>,
    /// Forms grouped by the frame that reported them
    #[serde(default)]
    pub forms: BTreeMap<i64, Vec<FormObservation>>,
    /// Fingerprinting API name to cumulative call count
    #[serde(default)]
    pub fingerprinting_calls: BTreeMap<String, u64>,
    #[serde(default)]
    pub mixed_content: Vec<MixedInclusion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p3p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_country: Option<String>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for PageSnapshot {
    fn default() -> Self {
        Self {
            category: default_category(),
            trackers: BTreeMap::new(),
            iframes: BTreeMap::new(),
            forms: BTreeMap::new(),
            fingerprinting_calls: BTreeMap::new(),
            mixed_content: Vec::new(),
            server: None,
            p3p: None,
            server_country: None,
        }
    }
}

impl PageSnapshot {
    /// Forms of every frame, in frame order.
    pub fn all_forms(&self) -> impl Iterator<Item = &FormObservation> {
        self.forms.values().flatten()
    }

    pub fn form_count(&self) -> usize {
        self.forms.values().map(Vec::len).sum()
    }

    pub fn total_fingerprinting_calls(&self) -> u64 {
        self.fingerprinting_calls.values().sum()
    }
}
