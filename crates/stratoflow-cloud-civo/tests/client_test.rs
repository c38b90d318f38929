//! Civo client against a mock API server

use httpmock::prelude::*;
use serde_json::{Value, json};
use std::time::Duration;
use stratoflow_cloud::{CloudError, CloudProvider, RetryConfig};
use stratoflow_cloud_civo::{CivoClient, CivoError, CivoProvider, ClientConfig};

fn client_for(server: &MockServer, max_attempts: u32) -> CivoClient {
    CivoClient::new(ClientConfig {
        token: Some("test-token".to_string()),
        region: "LON1".to_string(),
        api_url: server.base_url(),
        retry: RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            backoff_multiplier: 2.0,
        },
    })
    .unwrap()
}

#[tokio::test]
async fn test_get_sends_token_and_region_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/networks/net-1")
                .query_param("region", "LON1")
                .header("authorization", "Bearer test-token");
            then.status(200)
                .json_body(json!({ "id": "net-1", "label": "web" }));
        })
        .await;

    let client = client_for(&server, 0);
    let network: Value = client.get("networks/net-1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(network["label"], "web");
}

#[tokio::test]
async fn test_post_puts_region_in_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v2/networks")
                .json_body_partial(r#"{ "label": "web", "region": "FRA1" }"#);
            then.status(200)
                .json_body(json!({ "id": "net-1", "result": "success" }));
        })
        .await;

    let client = client_for(&server, 0).in_region(Some("FRA1"));
    let created: Value = client
        .post("networks", &json!({ "label": "web" }))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(created["id"], "net-1");
}

#[tokio::test]
async fn test_not_found_code_maps_to_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/instances/gone");
            then.status(404).json_body(json!({
                "code": "database_instance_not_found",
                "reason": "The requested instance could not be found"
            }));
        })
        .await;

    let client = client_for(&server, 0);
    let err = client.get::<Value>("instances/gone").await.unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(CloudError::from(err), CloudError::ResourceNotFound(_)));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/regions");
            then.status(503).body("unavailable");
        })
        .await;

    let client = client_for(&server, 2);
    let err = client.get::<Value>("regions").await.unwrap_err();

    mock.assert_hits_async(3).await;
    assert!(matches!(err, CivoError::Api { status: 503, .. }));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/v2/volumes");
            then.status(422)
                .json_body(json!({ "code": "invalid_size", "reason": "size_gb too small" }));
        })
        .await;

    let client = client_for(&server, 3);
    let err = client
        .post::<_, Value>("volumes", &json!({ "name": "data", "size_gb": 0 }))
        .await
        .unwrap_err();

    mock.assert_hits_async(1).await;
    assert!(err.to_string().contains("size_gb too small"));
}

#[tokio::test]
async fn test_missing_token_fails_without_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200).json_body(json!([]));
        })
        .await;

    let client = CivoClient::new(ClientConfig {
        token: None,
        api_url: server.base_url(),
        ..ClientConfig::default()
    })
    .unwrap();
    let err = client.get::<Value>("regions").await.unwrap_err();

    assert!(matches!(err, CivoError::MissingToken));
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_check_auth() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/v2/regions")
                .header("authorization", "Bearer test-token");
            then.status(200).json_body(json!([
                { "code": "LON1", "name": "London 1", "default": true },
                { "code": "FRA1", "name": "Frankfurt 1", "default": false }
            ]));
        })
        .await;

    let provider = CivoProvider::new(client_for(&server, 0));
    let status = provider.check_auth().await.unwrap();

    assert!(status.authenticated);
}

#[tokio::test]
async fn test_check_auth_rejected_token() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v2/regions");
            then.status(401)
                .json_body(json!({ "code": "authentication_invalid_key", "reason": "bad key" }));
        })
        .await;

    let provider = CivoProvider::new(client_for(&server, 0));
    let status = provider.check_auth().await.unwrap();

    assert!(!status.authenticated);
    assert!(status.error.unwrap().contains("bad key"));
}
