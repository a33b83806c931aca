//! Tab Registry Module
//!
//! Tracks the page shown in each tab and grows its snapshot from the
//! observations reported by the browser.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use super::observation::{
    HeaderField, Observation, ReputationAnswer, RequestObservation, ResourceType,
    ResponseObservation,
};
use super::site::{registrable_domain, url_host, url_scheme, SiteRecord};
use crate::cache::{CacheItem, TemporalCache};
use crate::error::{AuditError, Result};
use crate::geo::GeoRangeIndex;
use crate::score::{
    ClassificationReport, FormObservation, IframeObservation, MixedInclusion, Policy, ScoreEngine,
    TrackerObservation, TrackerReputation, DEFAULT_CATEGORY,
};

/// Browser tab identifier.
pub type TabId = i64;

// == Report Payload ==
/// Crowdsourced report for one page.
#[derive(Debug, Clone, Serialize)]
pub struct ReportPayload {
    pub run_id: String,
    #[serde(flatten)]
    pub site: SiteRecord,
}

// == Tab Registry ==
#[derive(Debug, Default)]
pub struct TabRegistry {
    sites: HashMap<TabId, SiteRecord>,
    scores: HashMap<TabId, ClassificationReport>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Lifecycle ==
    /// Starts a fresh record for `tab`, dropping whatever it showed before.
    pub fn register(&mut self, tab: TabId, url: &str) -> Result<&SiteRecord> {
        let record = SiteRecord::new(url)?;
        self.release(tab);
        debug!(tab, site = %record.site, "Page registered");
        Ok(self.sites.entry(tab).or_insert(record))
    }

    /// Re-registers `tab` on a committed navigation, carrying over the
    /// response metadata seen before the commit.
    pub fn commit_navigation(&mut self, tab: TabId, url: &str) -> Result<&SiteRecord> {
        let previous = self.site(tab)?;
        let server = previous.snapshot.server.clone();
        let p3p = previous.snapshot.p3p.clone();
        let ip = previous.ip.clone();
        let country = previous.snapshot.server_country.clone();
        let category = previous.snapshot.category.clone();

        self.register(tab, url)?;
        let record = self.site_mut(tab)?;
        record.snapshot.server = server;
        record.snapshot.p3p = p3p;
        record.ip = ip;
        record.snapshot.server_country = country;
        record.snapshot.category = category;
        Ok(&*record)
    }

    /// Drops the record and latest score of `tab`. Returns whether a record
    /// existed.
    pub fn release(&mut self, tab: TabId) -> bool {
        self.scores.remove(&tab);
        let released = self.sites.remove(&tab).is_some();
        if released {
            debug!(tab, "Tab released");
        }
        released
    }

    // == Observations ==
    /// Dispatches a tagged observation.
    pub fn observe(&mut self, tab: TabId, observation: Observation, geo: &GeoRangeIndex) -> Result<()> {
        match observation {
            Observation::Request(request) => self.observe_request(tab, &request),
            Observation::Headers { headers } => self.observe_headers(tab, &headers),
            Observation::Response(response) => self.observe_response(tab, &response, geo),
            Observation::Forms { frame_id, forms } => self.observe_forms(tab, frame_id, forms),
            Observation::Fingerprinting { calls } => {
                self.observe_fingerprinting(tab, calls.into_iter())
            }
        }
    }

    /// Records what a request reveals about the page. Main-frame requests
    /// register the page itself.
    pub fn observe_request(&mut self, tab: TabId, request: &RequestObservation) -> Result<()> {
        if request.resource_type == ResourceType::MainFrame {
            self.register(tab, &request.url)?;
            return Ok(());
        }

        let Some(host) = url_host(&request.url) else {
            return Err(AuditError::InvalidRequest(format!("url has no host: {}", request.url)));
        };
        let request_site = registrable_domain(&host);
        let record = self.site_mut(tab)?;
        let snapshot = &mut record.snapshot;

        if record.https
            && url_scheme(&request.url).as_deref() == Some("http")
            && !snapshot.mixed_content.iter().any(|inc| inc.url == request.url)
        {
            snapshot.mixed_content.push(MixedInclusion {
                kind: request.resource_type.inclusion_kind(),
                url: request.url.clone(),
            });
        }

        if request.resource_type == ResourceType::SubFrame && request_site != record.site {
            snapshot.iframes.insert(
                request.frame_id,
                IframeObservation {
                    url: request.url.clone(),
                    frame_id: request.frame_id,
                    parent_frame_id: request.parent_frame_id,
                },
            );
        }

        if let Some(rule) = &request.filter_rule_id {
            snapshot.trackers.insert(
                request_site.clone(),
                TrackerObservation::new(request_site, request.url.clone(), rule.clone(), request.frame_id),
            );
        }

        Ok(())
    }

    /// Takes the `Server` and `P3P` headers of the main document.
    pub fn observe_headers(&mut self, tab: TabId, headers: &[HeaderField]) -> Result<()> {
        let snapshot = &mut self.site_mut(tab)?.snapshot;
        for header in headers.iter().filter(|h| !h.value.is_empty()) {
            if header.name.eq_ignore_ascii_case("server") {
                snapshot.server = Some(header.value.clone());
            } else if header.name.eq_ignore_ascii_case("p3p") {
                snapshot.p3p = Some(header.value.clone());
            }
        }
        Ok(())
    }

    /// Resolves the serving address of the page, or of a known tracker.
    pub fn observe_response(
        &mut self,
        tab: TabId,
        response: &ResponseObservation,
        geo: &GeoRangeIndex,
    ) -> Result<()> {
        let record = self.site_mut(tab)?;
        if response.ip.is_empty() {
            return Ok(());
        }

        if response.main_frame {
            record.ip = Some(response.ip.clone());
            record.snapshot.server_country = Some(geo.lookup(&response.ip).to_string());
        } else if let Some(host) = url_host(&response.url) {
            if let Some(tracker) = record.snapshot.trackers.get_mut(&registrable_domain(&host)) {
                tracker.ip = Some(response.ip.clone());
                tracker.country = Some(geo.lookup(&response.ip).to_string());
            }
        }
        Ok(())
    }

    /// Replaces the forms reported by `frame`.
    pub fn observe_forms(&mut self, tab: TabId, frame: i64, forms: Vec<FormObservation>) -> Result<()> {
        self.site_mut(tab)?.snapshot.forms.insert(frame, forms);
        Ok(())
    }

    /// Adds to the cumulative per-API call counts.
    pub fn observe_fingerprinting(
        &mut self,
        tab: TabId,
        calls: impl Iterator<Item = (String, u64)>,
    ) -> Result<()> {
        let counts = &mut self.site_mut(tab)?.snapshot.fingerprinting_calls;
        for (api, n) in calls {
            *counts.entry(api).or_insert(0) += n;
        }
        Ok(())
    }

    // == Reputation ==
    /// Fills tracker reputations from `cache` and returns the trackers that
    /// still need an external lookup. Each tracker is handed out once.
    pub fn pending_trackers(
        &mut self,
        tab: TabId,
        cache: &mut TemporalCache<TrackerReputation>,
    ) -> Result<Vec<TrackerObservation>> {
        let record = self.site_mut(tab)?;
        let mut pending = Vec::new();

        for (domain, tracker) in record.snapshot.trackers.iter_mut() {
            if record.processed_trackers.contains(domain) {
                continue;
            }
            match cache.search(domain) {
                Some(reputation) => tracker.reputation = Some(reputation),
                None => pending.push(tracker.clone()),
            }
            record.processed_trackers.insert(domain.clone());
        }

        debug!(tab, pending = pending.len(), "Trackers pending reputation");
        Ok(pending)
    }

    /// Stores reputation answers in the tab's snapshot and the cache.
    pub fn apply_reputations(
        &mut self,
        tab: TabId,
        answers: Vec<ReputationAnswer>,
        cache: &mut TemporalCache<TrackerReputation>,
    ) -> Result<usize> {
        let record = self.site_mut(tab)?;
        let mut to_cache = Vec::with_capacity(answers.len());

        for answer in answers {
            let reputation = TrackerReputation {
                trust_score: answer.trust_score,
                confidence: answer.confidence,
            };
            if let Some(tracker) = record.snapshot.trackers.get_mut(&answer.domain) {
                tracker.reputation = Some(reputation.clone());
            }
            record.processed_trackers.insert(answer.domain.clone());
            to_cache.push(CacheItem::new(answer.domain, reputation));
        }

        let applied = to_cache.len();
        cache.insert(to_cache);
        Ok(applied)
    }

    // == Categories ==
    /// Records the user's category choice for a site.
    pub fn assign_category(cache: &mut TemporalCache<String>, domain: &str, category: &str) {
        cache.insert(vec![CacheItem::new(domain, category.to_string())]);
        info!(domain, category, "Category assigned");
    }

    // == Scoring ==
    /// Scores the tab's page under its cached category and keeps the result
    /// as the tab's latest score.
    pub fn score(
        &mut self,
        tab: TabId,
        categories: &mut TemporalCache<String>,
        engine: &ScoreEngine<'_>,
    ) -> Result<ClassificationReport> {
        let record = self.site_mut(tab)?;
        record.snapshot.category = categories
            .search(&record.site)
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let report = engine.classify(&record.snapshot);
        self.scores.insert(tab, report.clone());
        Ok(report)
    }

    pub fn latest_score(&self, tab: TabId) -> Option<&ClassificationReport> {
        self.scores.get(&tab)
    }

    // == Reporting ==
    /// Builds the crowdsourcing report, which requires the user's opt-in.
    pub fn report_payload(&self, tab: TabId, policy: &Policy, run_id: &str) -> Result<ReportPayload> {
        if !policy.reporting {
            return Err(AuditError::ReportingDisabled(
                "crowdsourcing is not enabled".to_string(),
            ));
        }
        Ok(ReportPayload {
            run_id: run_id.to_string(),
            site: self.site(tab)?.clone(),
        })
    }

    // == Accessors ==
    pub fn site(&self, tab: TabId) -> Result<&SiteRecord> {
        self.sites
            .get(&tab)
            .ok_or_else(|| AuditError::NotFound(format!("tab {}", tab)))
    }

    fn site_mut(&mut self, tab: TabId) -> Result<&mut SiteRecord> {
        self.sites
            .get_mut(&tab)
            .ok_or_else(|| AuditError::NotFound(format!("tab {}", tab)))
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
