//! API Handlers
//!
//! HTTP request handlers for each audit service endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::state::{bundle_value, AppState};
use crate::cache::CacheItem;
use crate::error::{AuditError, Result};
use crate::models::{
    AppliedResponse, CategoryRequest, CategoryResponse, GeoResponse, HealthResponse,
    MessageResponse, ObservationResponse, PageRequest, PendingTrackersResponse, ReputationsRequest, StatsResponse,
    TabResponse, TrackerResponse,
};
use crate::monitor::{Observation, ReportPayload, SiteRecord, TabId, TabRegistry};
use crate::score::{
    BenchmarkBundle, ClassificationReport, PageSnapshot, Policy, ScoreEngine, TrackerReputation,
};
use crate::storage::{BENCHMARKS_KEY, POLICY_KEY};

// == Service ==

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
///
/// Returns statistics of both caches and the size of the loaded datasets.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let tabs = state.tabs.read().await.len();
    let trackers = state.trackers.read().await.stats();
    let categories = state.categories.read().await.stats();
    let benchmark_categories = state.benchmarks.read().await.len();

    Json(StatsResponse {
        trackers: trackers.into(),
        categories: categories.into(),
        tabs,
        geo_ranges: state.geo.len(),
        benchmark_categories,
    })
}

/// Handler for GET /geo/:ip
pub async fn geo_handler(State(state): State<AppState>, Path(ip): Path<String>) -> Json<GeoResponse> {
    let country = state.geo.lookup(&ip).to_string();
    Json(GeoResponse { ip, country })
}

// == Policy & Benchmarks ==

/// Handler for GET /policy
pub async fn get_policy_handler(State(state): State<AppState>) -> Json<Map<String, Value>> {
    Json(state.policy.read().await.to_flat())
}

/// Handler for PUT /policy
///
/// Replaces the policy. Missing options fall back to their defaults.
pub async fn put_policy_handler(
    State(state): State<AppState>,
    Json(options): Json<Map<String, Value>>,
) -> Json<Map<String, Value>> {
    let policy = Policy::from_flat(&options);
    let flat = policy.to_flat();

    *state.policy.write().await = policy;
    state
        .storage
        .set(vec![(POLICY_KEY.to_string(), Value::Object(flat.clone()))]);
    info!("Policy updated");

    Json(flat)
}

/// Handler for GET /benchmarks
pub async fn get_benchmarks_handler(State(state): State<AppState>) -> Json<BenchmarkBundle> {
    Json(state.benchmarks.read().await.clone())
}

/// Handler for PUT /benchmarks
///
/// Replaces the benchmark bundle and persists it as the fallback snapshot.
pub async fn put_benchmarks_handler(
    State(state): State<AppState>,
    Json(bundle): Json<BenchmarkBundle>,
) -> Result<Json<MessageResponse>> {
    if bundle.is_empty() {
        return Err(AuditError::InvalidRequest(
            "Benchmark bundle has no categories".to_string(),
        ));
    }

    let value = bundle_value(&bundle)?;
    let count = bundle.len();
    *state.benchmarks.write().await = bundle;
    state.storage.set(vec![(BENCHMARKS_KEY.to_string(), value)]);
    info!(categories = count, "New benchmarks are loaded");

    Ok(Json(MessageResponse::new(format!(
        "Benchmarks replaced ({} categories)",
        count
    ))))
}

/// Handler for POST /score
///
/// Scores a snapshot supplied by the caller, without touching any tab.
pub async fn score_handler(
    State(state): State<AppState>,
    Json(snapshot): Json<PageSnapshot>,
) -> Json<ClassificationReport> {
    let benchmarks = state.benchmarks.read().await;
    let policy = state.policy.read().await;
    Json(ScoreEngine::new(&benchmarks, &policy).classify(&snapshot))
}

// == Caches ==

/// Handler for PUT /trackers
pub async fn put_trackers_handler(
    State(state): State<AppState>,
    Json(req): Json<ReputationsRequest>,
) -> Result<Json<AppliedResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AuditError::InvalidRequest(error_msg));
    }

    let items: Vec<CacheItem<TrackerReputation>> = req
        .reputations
        .into_iter()
        .map(|answer| {
            CacheItem::new(
                answer.domain,
                TrackerReputation {
                    trust_score: answer.trust_score,
                    confidence: answer.confidence,
                },
            )
        })
        .collect();
    let applied = items.len();
    state.trackers.write().await.insert(items);

    Ok(Json(AppliedResponse { applied }))
}

/// Handler for GET /trackers/:domain
pub async fn get_tracker_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<TrackerResponse>> {
    // Write lock: a miss may sweep expired records
    let reputation = state
        .trackers
        .write()
        .await
        .search(&domain)
        .ok_or_else(|| AuditError::NotFound(format!("tracker '{}'", domain)))?;

    Ok(Json(TrackerResponse { domain, reputation }))
}

/// Handler for PUT /categories
pub async fn put_category_handler(
    State(state): State<AppState>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<CategoryResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AuditError::InvalidRequest(error_msg));
    }

    let mut categories = state.categories.write().await;
    TabRegistry::assign_category(&mut categories, &req.domain, &req.category);

    Ok(Json(CategoryResponse {
        domain: req.domain,
        category: req.category,
    }))
}

/// Handler for GET /categories/:domain
pub async fn get_category_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<CategoryResponse>> {
    let category = state
        .categories
        .write()
        .await
        .search(&domain)
        .ok_or_else(|| AuditError::NotFound(format!("category for '{}'", domain)))?;

    Ok(Json(CategoryResponse { domain, category }))
}

// == Tabs ==

fn tab_response(tab: TabId, site: &SiteRecord) -> Json<TabResponse> {
    Json(TabResponse {
        tab,
        url: site.url.clone(),
        site: site.site.clone(),
    })
}

/// Handler for PUT /tabs/:tab
pub async fn register_tab_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
    Json(req): Json<PageRequest>,
) -> Result<Json<TabResponse>> {
    let mut tabs = state.tabs.write().await;
    let site = tabs.register(tab, &req.url)?;
    Ok(tab_response(tab, site))
}

/// Handler for POST /tabs/:tab/navigation
pub async fn navigation_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
    Json(req): Json<PageRequest>,
) -> Result<Json<TabResponse>> {
    let mut tabs = state.tabs.write().await;
    let site = tabs.commit_navigation(tab, &req.url)?;
    Ok(tab_response(tab, site))
}

/// Handler for POST /tabs/:tab/observations
///
/// For a forms report, answers with the positions of the leaky forms when
/// the policy asks for them to be marked.
pub async fn observation_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
    Json(observation): Json<Observation>,
) -> Result<Json<ObservationResponse>> {
    let leaky: Vec<usize> = match &observation {
        Observation::Forms { forms, .. } => forms
            .iter()
            .enumerate()
            .filter(|(_, form)| form.is_leaky())
            .map(|(index, _)| index)
            .collect(),
        _ => Vec::new(),
    };

    let mut tabs = state.tabs.write().await;
    tabs.observe(tab, observation, &state.geo)?;
    let mark_forms = if state.policy.read().await.mark_forms {
        leaky
    } else {
        Vec::new()
    };

    Ok(Json(ObservationResponse {
        message: "Observation recorded".to_string(),
        mark_forms,
    }))
}

/// Handler for GET /tabs/:tab/pending-trackers
///
/// Trackers of the page that the reputation cache could not answer.
pub async fn pending_trackers_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
) -> Result<Json<PendingTrackersResponse>> {
    let mut tabs = state.tabs.write().await;
    let mut trackers = state.trackers.write().await;
    let pending = tabs.pending_trackers(tab, &mut trackers)?;

    Ok(Json(PendingTrackersResponse {
        tab,
        run_id: state.run_id.to_string(),
        trackers: pending,
    }))
}

/// Handler for PUT /tabs/:tab/reputations
pub async fn reputations_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
    Json(req): Json<ReputationsRequest>,
) -> Result<Json<AppliedResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AuditError::InvalidRequest(error_msg));
    }

    let mut tabs = state.tabs.write().await;
    let mut trackers = state.trackers.write().await;
    let applied = tabs.apply_reputations(tab, req.reputations, &mut trackers)?;

    Ok(Json(AppliedResponse { applied }))
}

/// Handler for GET /tabs/:tab/score
pub async fn tab_score_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
) -> Result<Json<ClassificationReport>> {
    let mut tabs = state.tabs.write().await;
    let mut categories = state.categories.write().await;
    let benchmarks = state.benchmarks.read().await;
    let policy = state.policy.read().await;

    let engine = ScoreEngine::new(&benchmarks, &policy);
    let report = tabs.score(tab, &mut categories, &engine)?;
    debug!(tab, worst = %report.worst_level, issues = report.issue_count, "Tab scored");

    Ok(Json(report))
}

/// Handler for GET /tabs/:tab/latest-score
///
/// The last report computed for the tab, without scoring again.
pub async fn latest_score_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
) -> Result<Json<ClassificationReport>> {
    state
        .tabs
        .read()
        .await
        .latest_score(tab)
        .cloned()
        .map(Json)
        .ok_or_else(|| AuditError::NotFound(format!("score of tab {}", tab)))
}

/// Handler for POST /tabs/:tab/report
///
/// Builds the crowdsourcing payload; forbidden unless the user opted in.
pub async fn report_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
) -> Result<Json<ReportPayload>> {
    let tabs = state.tabs.read().await;
    let policy = state.policy.read().await;
    let payload = tabs.report_payload(tab, &policy, &state.run_id)?;
    info!(tab, site = %payload.site.site, "Report prepared");

    Ok(Json(payload))
}

/// Handler for DELETE /tabs/:tab
pub async fn release_tab_handler(
    State(state): State<AppState>,
    Path(tab): Path<TabId>,
) -> Result<Json<MessageResponse>> {
    if !state.tabs.write().await.release(tab) {
        return Err(AuditError::NotFound(format!("tab {}", tab)));
    }
    Ok(Json(MessageResponse::new(format!("Tab {} released", tab))))
}
