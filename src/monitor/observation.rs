//! Observations reported by the browser instrumentation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::score::{FormObservation, InclusionKind};

/// Resource types the monitor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
    SubFrame,
    Script,
    Image,
    #[serde(other)]
    Other,
}

impl ResourceType {
    pub fn inclusion_kind(self) -> InclusionKind {
        match self {
            ResourceType::Script => InclusionKind::Script,
            ResourceType::Image => InclusionKind::Image,
            _ => InclusionKind::Other,
        }
    }
}

/// An outgoing request issued by a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestObservation {
    pub url: String,
    pub resource_type: ResourceType,
    #[serde(default)]
    pub frame_id: i64,
    #[serde(default)]
    pub parent_frame_id: i64,
    /// Tracking-list rule the request matched, if any
    #[serde(default)]
    pub filter_rule_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

/// First bytes of a response with the address that served it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseObservation {
    pub url: String,
    pub ip: String,
    #[serde(default)]
    pub main_frame: bool,
}

// == Observation ==
/// One tagged observation, as posted to a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    Request(RequestObservation),
    Headers {
        headers: Vec<HeaderField>,
    },
    Response(ResponseObservation),
    Forms {
        frame_id: i64,
        forms: Vec<FormObservation>,
    },
    Fingerprinting {
        calls: BTreeMap<String, u64>,
    },
}

/// Answer of the external reputation service for one tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationAnswer {
    pub domain: String,
    pub trust_score: i64,
    pub confidence: i64,
}
