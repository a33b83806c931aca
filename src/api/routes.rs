//! API Routes
//!
//! Configures the Axum router with all audit service endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    geo_handler, get_benchmarks_handler, get_category_handler, get_policy_handler,
    get_tracker_handler, health_handler, latest_score_handler, navigation_handler,
    observation_handler, pending_trackers_handler, put_benchmarks_handler, put_category_handler,
    put_policy_handler, put_trackers_handler, register_tab_handler, release_tab_handler,
    report_handler, reputations_handler, score_handler, stats_handler, tab_score_handler,
};
use super::state::AppState;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health`, `GET /stats`, `GET /geo/:ip`
/// - `GET|PUT /policy`, `GET|PUT /benchmarks`, `POST /score`
/// - `PUT /trackers`, `GET /trackers/:domain`
/// - `PUT /categories`, `GET /categories/:domain`
/// - `PUT|DELETE /tabs/:tab`, plus per-tab `navigation`, `observations`,
///   `pending-trackers`, `reputations`, `score`, `latest-score` and `report`
///
/// # Middleware
/// - CORS: Allows any origin, the browser extension calls from its own origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/geo/:ip", get(geo_handler))
        .route("/policy", get(get_policy_handler).put(put_policy_handler))
        .route(
            "/benchmarks",
            get(get_benchmarks_handler).put(put_benchmarks_handler),
        )
        .route("/score", post(score_handler))
        .route("/trackers", put(put_trackers_handler))
        .route("/trackers/:domain", get(get_tracker_handler))
        .route("/categories", put(put_category_handler))
        .route("/categories/:domain", get(get_category_handler))
        .route(
            "/tabs/:tab",
            put(register_tab_handler).delete(release_tab_handler),
        )
        .route("/tabs/:tab/navigation", post(navigation_handler))
        .route("/tabs/:tab/observations", post(observation_handler))
        .route("/tabs/:tab/pending-trackers", get(pending_trackers_handler))
        .route("/tabs/:tab/reputations", put(reputations_handler))
        .route("/tabs/:tab/score", get(tab_score_handler))
        .route("/tabs/:tab/latest-score", get(latest_score_handler))
        .route("/tabs/:tab/report", post(report_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
