//! Tests for bearer-token authentication on the API surface.


use axum::http::StatusCode;

use test_helpers::{make_auth_test_state, TestApp};

#[tokio::test]
async fn test_requests_without_a_token_are_rejected() {
    let app = TestApp::with_state(make_auth_test_state("secret-token"));
    let (status, body) = app.call("GET", "/api/v1/buckets", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // the rejection carries the wire status shape, not a bare string
    let err: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(err["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let app = TestApp::with_state(make_auth_test_state("secret-token"));
    let (status, _) = app
        .call_with_headers(
            "GET",
            "/api/v1/buckets",
            None,
            &[("Authorization", "Bearer wrong")],
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_correct_token_is_accepted() {
    let app = TestApp::with_state(make_auth_test_state("secret-token"));
    let (status, _) = app
        .call_with_headers(
            "GET",
            "/api/v1/buckets",
            None,
            &[("Authorization", "Bearer secret-token")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_discovery_endpoints_are_exempt_from_auth() {
    let app = TestApp::with_state(make_auth_test_state("secret-token"));

    let (status, _) = app.call("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    // clients need the topology to find gateway nodes before they can log in
    let (status, _) = app.call("GET", "/api/v1/topology", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_auth_disabled_allows_everything() {
    let app = TestApp::new();
    let (status, _) = app.call("GET", "/api/v1/buckets", None).await;
    assert_eq!(status, StatusCode::OK);
}
