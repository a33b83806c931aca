//! Population benchmarks used as the comparison baseline.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::error::{AuditError, FetchError, Result};

/// Benchmarks shipped with the binary, used when nothing fresher is available.
pub const BUNDLED_BENCHMARKS: &str = include_str!("../../assets/default_benchmarks.json");

/// Time allowed for downloading the live bundle.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// == Benchmark Stat ==
/// Summary statistics of one metric over the crawled population.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkStat {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub mean: f64,
    pub sd: f64,
    pub max: f64,
}

// == Category Benchmarks ==
/// Every metric the scoring widgets consult, for one site category.
///
/// Additional metrics present in the source data are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBenchmarks {
    pub tracker_count: BenchmarkStat,
    pub fapi_cardinality: BenchmarkStat,
    pub fapi_raw_count: BenchmarkStat,
    pub tp_iframe_count: BenchmarkStat,
    pub form_count: BenchmarkStat,
}

// == Benchmark Bundle ==
/// Benchmarks keyed by site category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct BenchmarkBundle {
    categories: BTreeMap<String, CategoryBenchmarks>,
}

/// Where the active bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkSource {
    Remote,
    File,
    Persisted,
    Bundled,
}

impl BenchmarkBundle {
    pub fn new(categories: BTreeMap<String, CategoryBenchmarks>) -> Self {
        Self { categories }
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn from_value(value: Value) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The bundle compiled into the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_BENCHMARKS)
            .map_err(|e| AuditError::Internal(format!("bundled benchmarks unreadable: {}", e)))
    }

    // == Fetch ==
    /// Downloads the live bundle from `url`, tagged with the crawl `run_id`
    /// when one is set.
    pub async fn fetch(url: &str, run_id: &str) -> std::result::Result<Self, FetchError> {
        let mut endpoint = Url::parse(url)?;
        if !run_id.is_empty() {
            endpoint.query_pairs_mut().append_pair("run_id", run_id);
        }

        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        let bundle = client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<Self>()
            .await?;
        Ok(bundle)
    }

    // == Load With Fallback ==
    /// Loads benchmarks from the live `url`, else from the file at `path`,
    /// else from the `persisted` snapshot, else from the bundled default.
    pub async fn load_with_fallback(
        url: Option<&str>,
        run_id: &str,
        path: Option<&Path>,
        persisted: Option<&Value>,
    ) -> Result<(Self, BenchmarkSource)> {
        if let Some(url) = url {
            match Self::fetch(url, run_id).await {
                Ok(bundle) if !bundle.is_empty() => {
                    info!(url, "New benchmarks are loaded");
                    return Ok((bundle, BenchmarkSource::Remote));
                }
                Ok(_) => warn!(url, "Fetched benchmarks have no categories"),
                Err(e) => warn!(url, error = %e, "Cannot fetch benchmarks"),
            }
        }

        if let Some(path) = path {
            match tokio::fs::read_to_string(path)
                .await
                .map_err(|e| e.to_string())
                .and_then(|text| Self::from_json(&text).map_err(|e| e.to_string()))
            {
                Ok(bundle) => {
                    info!(path = %path.display(), "Benchmarks file is loaded");
                    return Ok((bundle, BenchmarkSource::File));
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Cannot load benchmarks file"),
            }
        }

        if let Some(value) = persisted {
            match Self::from_value(value.clone()) {
                Ok(bundle) => {
                    info!("Old benchmarks are loaded");
                    return Ok((bundle, BenchmarkSource::Persisted));
                }
                Err(e) => warn!(error = %e, "Stored benchmarks unreadable"),
            }
        }

        info!("Bundled benchmarks are loaded");
        Ok((Self::bundled()?, BenchmarkSource::Bundled))
    }

    pub fn get(&self, category: &str) -> Option<&CategoryBenchmarks> {
        self.categories.get(category)
    }

    /// Categories in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &CategoryBenchmarks)> {
        self.categories.iter()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stat_json(mean: f64) -> Value {
        json!({"min": 0, "q1": 1, "median": 2, "q3": 3, "mean": mean, "sd": 1, "max": 9})
    }

    fn category_json(mean: f64) -> Value {
        json!({
            "tracker_count": stat_json(mean),
            "fapi_cardinality": stat_json(mean),
            "fapi_raw_count": stat_json(mean),
            "tp_iframe_count": stat_json(mean),
            "form_count": stat_json(mean),
            "cookie_count": stat_json(mean),
        })
    }

    #[test]
    fn test_bundled_benchmarks_parse() {
        let bundle = BenchmarkBundle::bundled().unwrap();
        assert!(bundle.get("unspecified").is_some());
        assert!(bundle.len() >= 2);
    }

    #[test]
    fn test_bundle_ignores_extra_metrics() {
        let bundle = BenchmarkBundle::from_value(json!({"news": category_json(4.0)})).unwrap();
        assert_eq!(bundle.get("news").unwrap().tracker_count.mean, 4.0);
    }

    #[test]
    fn test_bundle_requires_every_metric() {
        let result = BenchmarkBundle::from_value(json!({"news": {"tracker_count": stat_json(1.0)}}));
        assert!(result.is_err());
    }

    /// A local address nothing listens on.
    async fn closed_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/stats", addr)
    }

    /// Serves `body` at `/stats`, only for the `crawl-7` run.
    async fn serve_stats(body: Value) -> String {
        use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
        use std::collections::HashMap;

        let app = Router::new().route(
            "/stats",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let body = body.clone();
                async move {
                    if params.get("run_id").map(String::as_str) == Some("crawl-7") {
                        Ok(Json(body))
                    } else {
                        Err(StatusCode::NOT_FOUND)
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}/stats", addr)
    }

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("privacy_audit_bench_{}_{}.json", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_fetch_live_bundle() {
        let url = serve_stats(json!({"live": category_json(3.0)})).await;

        let (bundle, source) = BenchmarkBundle::load_with_fallback(Some(&url), "crawl-7", None, None)
            .await
            .unwrap();
        assert_eq!(source, BenchmarkSource::Remote);
        assert!(bundle.get("live").is_some());
    }

    #[tokio::test]
    async fn test_fetch_error_status_falls_back() {
        let url = serve_stats(json!({"live": category_json(3.0)})).await;
        let persisted = json!({"custom": category_json(7.0)});

        // wrong run id gets a 404
        let (bundle, source) =
            BenchmarkBundle::load_with_fallback(Some(&url), "other", None, Some(&persisted))
                .await
                .unwrap();
        assert_eq!(source, BenchmarkSource::Persisted);
        assert!(bundle.get("custom").is_some());
    }

    #[tokio::test]
    async fn test_unreachable_fetch_falls_back_to_file() {
        let url = closed_url().await;
        let path = temp_file("unreachable", &json!({"file": category_json(2.0)}).to_string());

        let (bundle, source) =
            BenchmarkBundle::load_with_fallback(Some(&url), "", Some(&path), None)
                .await
                .unwrap();
        assert_eq!(source, BenchmarkSource::File);
        assert!(bundle.get("file").is_some());

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_invalid_url_falls_back_to_bundled() {
        let (_, source) = BenchmarkBundle::load_with_fallback(Some("not a url"), "", None, None)
            .await
            .unwrap();
        assert_eq!(source, BenchmarkSource::Bundled);
    }

    #[tokio::test]
    async fn test_fallback_prefers_persisted_over_bundled() {
        let persisted = json!({"custom": category_json(7.0)});
        let missing = Path::new("/definitely/not/here.json");

        let (bundle, source) =
            BenchmarkBundle::load_with_fallback(None, "", Some(missing), Some(&persisted))
                .await
                .unwrap();
        assert_eq!(source, BenchmarkSource::Persisted);
        assert!(bundle.get("custom").is_some());
    }

    #[tokio::test]
    async fn test_fallback_to_bundled() {
        let garbage = json!("not a bundle");
        let (_, source) = BenchmarkBundle::load_with_fallback(None, "", None, Some(&garbage))
            .await
            .unwrap();
        assert_eq!(source, BenchmarkSource::Bundled);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = temp_file("file", &json!({"file": category_json(2.0)}).to_string());

        let (bundle, source) = BenchmarkBundle::load_with_fallback(None, "", Some(&path), None)
            .await
            .unwrap();
        assert_eq!(source, BenchmarkSource::File);
        assert!(bundle.get("file").is_some());

        let _ = std::fs::remove_file(&path);
    }
}
