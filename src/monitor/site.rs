//! Site Record Module
//!
//! The per-tab page record and the URL helpers used to build it.

use std::collections::BTreeSet;
use std::net::IpAddr;

use serde::Serialize;
use url::Url;

use crate::error::{AuditError, Result};
use crate::score::PageSnapshot;

/// Parses an absolute URL.
pub fn parse_url(url: &str) -> Option<Url> {
    Url::parse(url).ok()
}

/// URL without query string or fragment, in normalised form.
pub fn url_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_query(None);
    key.set_fragment(None);
    key.to_string()
}

/// Query string without the leading `?`, empty when absent.
pub fn url_query(url: &str) -> String {
    parse_url(url)
        .and_then(|u| u.query().map(str::to_string))
        .unwrap_or_default()
}

/// Lowercased scheme, e.g. `https`.
pub fn url_scheme(url: &str) -> Option<String> {
    parse_url(url).map(|u| u.scheme().to_string())
}

/// Host of an absolute URL, without user info or port. IPv6 hosts keep
/// their brackets.
pub fn url_host(url: &str) -> Option<String> {
    parse_url(url).and_then(|u| u.host_str().map(|s| s.to_string()))
}

/// Whether the URL is fetched over http or https.
pub fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Site a host belongs to: its registrable domain under the public suffix
/// list, or the host itself for IP literals and bare suffixes.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.');
    if host.starts_with('[') || host.parse::<IpAddr>().is_ok() {
        return host.to_string();
    }

    psl::domain_str(host).unwrap_or(host).to_string()
}

// == Site Record ==
/// Everything known about the page currently shown in one tab.
#[derive(Debug, Clone, Serialize)]
pub struct SiteRecord {
    /// Page URL without query or fragment
    pub url: String,
    pub query: String,
    pub host: String,
    /// Registrable domain of `host`
    pub site: String,
    pub https: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    pub snapshot: PageSnapshot,
    /// Tracker domains already looked up in the reputation cache
    #[serde(skip)]
    pub processed_trackers: BTreeSet<String>,
}

impl SiteRecord {
    /// Starts an empty record for a page at `url`.
    pub fn new(url: &str) -> Result<Self> {
        let parsed = parse_url(url)
            .filter(is_web_url)
            .ok_or_else(|| AuditError::InvalidRequest(format!("not a web url: {}", url)))?;
        let host = parsed
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| AuditError::InvalidRequest(format!("url has no host: {}", url)))?;

        Ok(Self {
            url: url_key(&parsed),
            query: parsed.query().unwrap_or_default().to_string(),
            site: registrable_domain(&host),
            https: parsed.scheme() == "https",
            host,
            ip: None,
            snapshot: PageSnapshot::default(),
            processed_trackers: BTreeSet::new(),
        })
    }
}
