use std::collections::{HashMap, HashSet};
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::tempdir;
use tower::ServiceExt;

use spindle_core::persist::{save_snapshot, ArtifactPaths, CrawlSnapshot};
use spindle_server::{build_app, SearchConfig};

fn dump_tiny_crawl(dir: &Path) {
    let mut contents = HashMap::new();
    contents.insert(
        "http://a.test".to_string(),
        "rust rust rust compiler".to_string(),
    );
    contents.insert(
        "http://b.test".to_string(),
        "rust compiler tooling guide".to_string(),
    );

    let mut references: HashMap<String, HashSet<String>> = HashMap::new();
    references.insert(
        "http://a.test".to_string(),
        ["http://b.test".to_string()].into_iter().collect(),
    );
    references.insert(
        "http://b.test".to_string(),
        ["http://a.test".to_string()].into_iter().collect(),
    );

    let snapshot = CrawlSnapshot {
        contents,
        references,
    };
    save_snapshot(
        &ArtifactPaths::new(dir),
        &snapshot,
        "2024-01-01T00:00:00Z",
    )
    .unwrap();
}

fn tiny_app(dir: &Path) -> Router {
    build_app(dir.to_str().unwrap(), SearchConfig::default()).unwrap()
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    dump_tiny_crawl(dir.path());

    let (status, json) = call(tiny_app(dir.path()), "/search?q=rust&k=10").await;
    assert_eq!(status, StatusCode::OK);
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["url"], "http://a.test");
    assert_eq!(json["total_hits"], 2);
}

#[tokio::test]
async fn search_with_pagerank_blending_succeeds() {
    let dir = tempdir().unwrap();
    dump_tiny_crawl(dir.path());

    let (status, json) = call(
        tiny_app(dir.path()),
        "/search?q=rust&k=10&pagerank=true",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn boolean_query_intersects() {
    let dir = tempdir().unwrap();
    dump_tiny_crawl(dir.path());

    let (status, json) = call(tiny_app(dir.path()), "/boolean?q=rust%20AND%20tooling").await;
    assert_eq!(status, StatusCode::OK);
    let urls = json["urls"].as_array().unwrap();
    assert_eq!(urls.len(), 1);
    assert_eq!(urls[0], "http://b.test");
}

#[tokio::test]
async fn malformed_boolean_query_is_a_bad_request() {
    let dir = tempdir().unwrap();
    dump_tiny_crawl(dir.path());

    let (status, _) = call(tiny_app(dir.path()), "/boolean?q=(rust%20AND").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
