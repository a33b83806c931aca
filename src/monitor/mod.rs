//! Monitor Module
//!
//! Per-tab page lifecycle: builds the snapshot the score engine consumes and
//! enriches it from the reputation and category caches.

mod observation;
mod registry;
mod site;

pub use observation::{
    HeaderField, Observation, ReputationAnswer, RequestObservation, ResourceType,
    ResponseObservation,
};
pub use registry::{ReportPayload, TabId, TabRegistry};
pub use site::{parse_url, registrable_domain, url_host, url_key, url_query, SiteRecord};
