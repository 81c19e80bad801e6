//! Integration tests for `SerpApiClient`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made. Covers the per-engine request shape, each error
//! variant `search_source` can return, and the fan-out in
//! `search_all_sources`.

use std::time::Duration;

use pricepilot_core::{Country, SourceId};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricepilot_sources::{FetchError, RawSourceResult, SerpApiClient};

/// 5-second timeout, descriptive UA, pointed at the mock server.
fn test_client(server: &MockServer) -> SerpApiClient {
    SerpApiClient::new("test-key", 5, "pricepilot-test/0.1")
        .expect("failed to build test SerpApiClient")
        .with_base_url(&server.uri())
        .expect("mock server URI is valid")
}

// ---------------------------------------------------------------------------
// search_source
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_source_sends_engine_params_and_returns_payload() {
    let server = MockServer::start().await;
    let body = json!({"shopping_results": [{"title": "Apple iPhone 16 Pro"}]});

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_shopping"))
        .and(query_param("q", "iphone 16 pro"))
        .and(query_param("gl", "us"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let payload = test_client(&server)
        .search_source(SourceId::GoogleShopping, "iphone 16 pro", Country::Us)
        .await
        .expect("search should succeed");
    assert_eq!(payload, body);
}

#[tokio::test]
async fn search_source_maps_error_body_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&json!({"error": "Invalid API key."})),
        )
        .mount(&server)
        .await;

    let err = test_client(&server)
        .search_source(SourceId::Amazon, "kindle", Country::Us)
        .await
        .unwrap_err();
    match err {
        FetchError::Api { source_id, message } => {
            assert_eq!(source_id, SourceId::Amazon);
            assert_eq!(message, "Invalid API key.");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn search_source_maps_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .search_source(SourceId::Ebay, "switch", Country::Us)
        .await
        .unwrap_err();
    assert!(
        matches!(err, FetchError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus, got: {err:?}"
    );
}

#[tokio::test]
async fn search_source_rejects_non_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .search_source(SourceId::GoogleGeneral, "switch", Country::Us)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Deserialize { .. }));
}

// ---------------------------------------------------------------------------
// search_all_sources
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_all_sources_turns_failures_into_markers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google_shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"shopping_results": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "amazon"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"organic_results": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "ebay"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&json!({"organic_results": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let set = test_client(&server)
        .search_all_sources(
            "switch",
            Country::Us,
            Duration::from_millis(500),
            Duration::from_secs(10),
        )
        .await;

    assert_eq!(set.len(), 4);
    assert!(matches!(
        set.get(SourceId::GoogleShopping),
        Some(RawSourceResult::Payload(_))
    ));
    assert_eq!(set.failed_sources(), vec![SourceId::Amazon, SourceId::Ebay]);
    match set.get(SourceId::Ebay) {
        Some(RawSourceResult::Failed { error }) => assert!(error.contains("timed out")),
        other => panic!("expected timeout marker, got: {other:?}"),
    }
}

#[tokio::test]
async fn search_all_sources_skips_marketplaces_without_local_site() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"organic_results": []})))
        .mount(&server)
        .await;

    let set = test_client(&server)
        .search_all_sources(
            "kindle",
            Country::Jp,
            Duration::from_secs(5),
            Duration::from_secs(10),
        )
        .await;

    let sources: Vec<SourceId> = set.iter().map(|(id, _)| id).collect();
    assert_eq!(sources, vec![SourceId::GoogleShopping, SourceId::GoogleGeneral]);
    assert!(set.failed_sources().is_empty());
}

// ---------------------------------------------------------------------------
// test_connection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_connection_sends_single_result_web_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("engine", "google"))
        .and(query_param("q", "test"))
        .and(query_param("num", "1"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({"organic_results": []})))
        .expect(1)
        .mount(&server)
        .await;

    test_client(&server)
        .test_connection()
        .await
        .expect("connection check should succeed");
}

#[tokio::test]
async fn test_connection_reports_invalid_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(&json!({"error": "Invalid API key."})),
        )
        .mount(&server)
        .await;

    let err = test_client(&server)
        .test_connection()
        .await
        .expect_err("error body must fail the check");

    match err {
        FetchError::Api { source_id, message } => {
            assert_eq!(source_id, SourceId::GoogleGeneral);
            assert_eq!(message, "Invalid API key.");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}
