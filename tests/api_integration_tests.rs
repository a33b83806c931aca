//! Integration Tests for API Endpoints
//!
//! Drives the full router through request/response cycles, including a
//! restart against the same durable store.

use std::collections::HashMap;
use std::path::PathBuf;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use privacy_audit::{
    api::create_router,
    geo::{GeoRangeIndex, IpRange},
    storage::{spawn_storage_writer, JsonFileStore, KvStore},
    AppState, Config,
};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

// == Helper Functions ==

fn test_geo() -> GeoRangeIndex {
    GeoRangeIndex::build(vec![
        IpRange::new(0, 16_777_215, "-"),
        IpRange::new(16_777_216, 33_554_431, "Australia"),
        IpRange::new(33_554_432, 50_331_647, "France"),
        IpRange::new(50_331_648, 67_108_863, "United States"),
    ])
}

fn create_test_app() -> Router {
    let state = AppState::in_memory(&Config::default())
        .unwrap()
        .with_geo(test_geo());
    create_router(state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn temp_store_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("privacy_audit_it_{}_{}.json", name, std::process::id()));
    let _ = std::fs::remove_file(&path);
    path
}

// == Service Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();
    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"].as_str().unwrap(), "healthy");
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();
    send(&app, "PUT", "/categories", Some(json!({"domain": "daily.com", "category": "news"}))).await;
    send(&app, "GET", "/categories/daily.com", None).await;
    send(&app, "GET", "/categories/other.com", None).await;

    let (status, json) = send(&app, "GET", "/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["categories"]["hits"].as_u64().unwrap(), 1);
    assert_eq!(json["categories"]["misses"].as_u64().unwrap(), 1);
    assert_eq!(json["categories"]["total_entries"].as_u64().unwrap(), 1);
    assert_eq!(json["geo_ranges"].as_u64().unwrap(), 4);
    assert_eq!(json["tabs"].as_u64().unwrap(), 0);
}

#[tokio::test]
async fn test_geo_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/geo/2.10.0.1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["country"], "France");

    let (_, json) = send(&app, "GET", "/geo/256.1.1.1", None).await;
    assert_eq!(json["country"], "Unknown");
}

// == Policy & Benchmark Tests ==

#[tokio::test]
async fn test_policy_roundtrip() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/policy", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["trackers_engine"], "sigma");
    assert_eq!(json["crowdsourcing"], true);

    let (status, json) = send(
        &app,
        "PUT",
        "/policy",
        Some(json!({"trackers_engine": "quartile", "leakyforms_baseline": "orange"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["trackers_engine"], "quartile");
    assert_eq!(json["leakyforms_baseline"], "warning");

    let (_, json) = send(&app, "GET", "/policy", None).await;
    assert_eq!(json["trackers_engine"], "quartile");
}

#[tokio::test]
async fn test_benchmarks_replace() {
    let app = create_test_app();
    let stat = json!({"min": 0, "q1": 1, "median": 2, "q3": 3, "mean": 2, "sd": 1, "max": 9});
    let category = json!({
        "tracker_count": stat,
        "fapi_cardinality": stat,
        "fapi_raw_count": stat,
        "tp_iframe_count": stat,
        "form_count": stat,
    });

    let (status, _) = send(&app, "PUT", "/benchmarks", Some(json!({"travel": category}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", "/benchmarks", None).await;
    assert_eq!(json.as_object().unwrap().len(), 1);
    assert_eq!(json["travel"]["form_count"]["q3"], 3.0);

    let (status, _) = send(&app, "PUT", "/benchmarks", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_score_adhoc_snapshot() {
    let app = create_test_app();
    let snapshot = json!({
        "forms": {
            "0": [{
                "action": "(unknown)",
                "method": "post",
                "protocol": "http",
                "visible_input_count": 3,
            }]
        }
    });

    let (status, json) = send(&app, "POST", "/score", Some(snapshot)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "unspecified");

    let problems = &json["categories"]["unspecified"]["widgets"]["leakyforms"]["problems"];
    assert_eq!(problems[0]["level"], "warning");
    assert_eq!(
        problems[0]["message"],
        "There are unprotected non-HTTPS forms on this page"
    );
}

// == Cache Endpoint Tests ==

#[tokio::test]
async fn test_tracker_reputation_cache() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        "PUT",
        "/trackers",
        Some(json!({"reputations": [{"domain": "ads.net", "trust_score": 12, "confidence": 44}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["applied"], 1);

    let (status, json) = send(&app, "GET", "/trackers/ads.net", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["reputation"]["trust_score"], 12);

    let (status, json) = send(&app, "GET", "/trackers/unknown.net", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("unknown.net"));
}

#[tokio::test]
async fn test_category_validation() {
    let app = create_test_app();
    let (status, _) = send(
        &app,
        "PUT",
        "/categories",
        Some(json!({"domain": "daily.com", "category": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == Tab Lifecycle Tests ==

#[tokio::test]
async fn test_full_tab_lifecycle() {
    let app = create_test_app();

    let (status, json) = send(&app, "PUT", "/tabs/5", Some(json!({"url": "https://www.daily.com/a?x=1"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["site"], "daily.com");

    let observations = [
        json!({"kind": "headers", "headers": [{"name": "Server", "value": "Apache/2.0.52"}]}),
        json!({"kind": "response", "url": "https://www.daily.com/a", "ip": "3.1.1.1", "main_frame": true}),
        json!({"kind": "request", "url": "https://px.ads.net/p.gif", "resource_type": "image", "filter_rule_id": "||ads.net^"}),
        json!({"kind": "request", "url": "https://cdn.metrics.io/m.js", "resource_type": "script", "filter_rule_id": "||metrics.io^"}),
        json!({"kind": "response", "url": "https://px.ads.net/p.gif", "ip": "2.2.2.2"}),
        json!({"kind": "response", "url": "https://cdn.metrics.io/m.js", "ip": "1.1.1.1"}),
        json!({"kind": "forms", "frame_id": 0, "forms": [
            {"action": "https://daily.com/login", "method": "get", "protocol": "https", "has_password": true, "visible_input_count": 2}
        ]}),
        json!({"kind": "fingerprinting", "calls": {"canvas": 4}}),
    ];
    for observation in observations {
        let forms = observation["kind"] == "forms";
        let (status, json) = send(&app, "POST", "/tabs/5/observations", Some(observation)).await;
        assert_eq!(status, StatusCode::OK);
        if forms {
            // the GET form is marked
            assert_eq!(json["mark_forms"], json!([0]));
        }
    }

    let (status, json) = send(&app, "GET", "/tabs/5/pending-trackers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["trackers"].as_array().unwrap().len(), 2);

    // answered trackers are not requested again
    let (_, json) = send(&app, "GET", "/tabs/5/pending-trackers", None).await;
    assert!(json["trackers"].as_array().unwrap().is_empty());

    let (status, _) = send(
        &app,
        "PUT",
        "/tabs/5/reputations",
        Some(json!({"reputations": [{"domain": "ads.net", "trust_score": 8, "confidence": 60}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    send(&app, "PUT", "/categories", Some(json!({"domain": "daily.com", "category": "news"}))).await;

    let (status, _) = send(&app, "GET", "/tabs/5/latest-score", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = send(&app, "GET", "/tabs/5/score", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "news");
    assert_eq!(json["worst_level"], "severe");

    let (status, latest) = send(&app, "GET", "/tabs/5/latest-score", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(latest, json);

    let trackers = &json["categories"]["news"]["widgets"]["trackers"];
    assert_eq!(trackers["plot"]["current_value"], 2);
    let messages: Vec<&str> = trackers["problems"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["message"].as_str().unwrap())
        .collect();
    assert!(messages.contains(&"There are many international trackers on this page"));
    assert!(messages.contains(&"There are trackers with low reputation on this page"));

    let general = &json["categories"]["news"]["widgets"]["general"]["problems"];
    assert_eq!(general[0]["level"], "severe");

    let (status, json) = send(&app, "POST", "/tabs/5/report", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["site"], "daily.com");
    assert_eq!(json["snapshot"]["server_country"], "United States");

    let (status, _) = send(&app, "DELETE", "/tabs/5", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/tabs/5/score", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_navigation_keeps_server_metadata() {
    let app = create_test_app();
    send(&app, "PUT", "/tabs/9", Some(json!({"url": "https://shop.example.com/"}))).await;
    send(
        &app,
        "POST",
        "/tabs/9/observations",
        Some(json!({"kind": "headers", "headers": [{"name": "p3p", "value": "CP=\"NOI\""}]})),
    )
    .await;

    let (status, _) = send(&app, "POST", "/tabs/9/navigation", Some(json!({"url": "https://shop.example.com/cart"}))).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", "/tabs/9/score", None).await;
    let general = &json["categories"]["unspecified"]["widgets"]["general"]["problems"];
    assert_eq!(general[0]["message"], "This site has a published P3P policy");
    assert_eq!(general[0]["level"], "good");
}

#[tokio::test]
async fn test_report_forbidden_without_opt_in() {
    let app = create_test_app();
    send(&app, "PUT", "/tabs/3", Some(json!({"url": "https://www.daily.com/"}))).await;
    send(&app, "PUT", "/policy", Some(json!({"crowdsourcing": false}))).await;

    let (status, json) = send(&app, "POST", "/tabs/3/report", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json["error"].as_str().unwrap().contains("Reporting disabled"));
}

// == Error Response Tests ==

#[tokio::test]
async fn test_observation_for_unknown_tab() {
    let app = create_test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/tabs/77/observations",
        Some(json!({"kind": "fingerprinting", "calls": {"canvas": 1}})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/categories")
                .header("content-type", "application/json")
                .body(Body::from("not valid json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_register_rejects_non_web_url() {
    let app = create_test_app();
    let (status, _) = send(&app, "PUT", "/tabs/1", Some(json!({"url": "chrome://newtab"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// == Persistence Tests ==

#[tokio::test]
async fn test_state_survives_restart() {
    let path = temp_store_path("restart");
    let config = Config {
        storage_path: path.clone(),
        ..Config::default()
    };

    {
        let store = assert_ok!(JsonFileStore::open(&path));
        let persisted = assert_ok!(store.load_all());
        let (mirror, writer) = spawn_storage_writer(store);
        let app = create_router(assert_ok!(AppState::bootstrap(&config, &persisted, mirror).await));

        send(&app, "PUT", "/categories", Some(json!({"domain": "daily.com", "category": "news"}))).await;
        send(
            &app,
            "PUT",
            "/trackers",
            Some(json!({"reputations": [{"domain": "ads.net", "trust_score": 70, "confidence": 20}]})),
        )
        .await;
        send(&app, "PUT", "/policy", Some(json!({"warn_security": false}))).await;

        drop(app);
        assert_ok!(writer.await);
    }

    let store = assert_ok!(JsonFileStore::open(&path));
    let persisted: HashMap<String, Value> = assert_ok!(store.load_all());
    assert!(persisted.contains_key("category:daily.com"));
    assert!(persisted.contains_key("tracker:ads.net"));

    let (mirror, _writer) = spawn_storage_writer(store);
    let app = create_router(assert_ok!(AppState::bootstrap(&config, &persisted, mirror).await));

    let (status, json) = send(&app, "GET", "/categories/daily.com", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["category"], "news");

    let (status, _) = send(&app, "GET", "/trackers/ads.net", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", "/policy", None).await;
    assert_eq!(json["warn_security"], false);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_corrupt_store_is_an_error() {
    let path = temp_store_path("corrupt");
    std::fs::write(&path, "{ not json").unwrap();

    assert_err!(JsonFileStore::open(&path));
    let _ = std::fs::remove_file(&path);
}
