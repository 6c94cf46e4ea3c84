//! Integration tests for the join-room token request.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::TcpListener;
use std::time::Duration;

use common::types::RoomName;
use room_client::config::ClientConfig;
use room_client::errors::ClientError;
use room_client::token_client::TokenClient;
use room_test_utils::{mount_join_room, mount_join_room_response, requested_room_names};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> TokenClient {
    TokenClient::new(&ClientConfig::new(server.uri())).unwrap()
}

fn room(name: &str) -> RoomName {
    RoomName::parse(name).unwrap()
}

#[tokio::test]
async fn test_request_token_posts_room_name_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/join-room"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({ "roomName": "demo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "abc"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client_for(&server)
        .request_token(&room("demo"))
        .await
        .unwrap();

    assert_eq!(token.expose(), "abc");
}

#[tokio::test]
async fn test_request_token_for_various_room_names() {
    let server = MockServer::start().await;
    mount_join_room(&server, "abc").await;
    let client = client_for(&server);

    for name in ["demo", "team standup", "räum-42"] {
        let token = client.request_token(&room(name)).await.unwrap();
        assert_eq!(token.expose(), "abc");
    }

    assert_eq!(
        requested_room_names(&server).await,
        vec!["demo", "team standup", "räum-42"]
    );
}

#[tokio::test]
async fn test_missing_token_field_is_protocol_error_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/join-room"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "identity": "alice"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).request_token(&room("demo")).await;

    assert!(matches!(result, Err(ClientError::Protocol(_))));
}

#[tokio::test]
async fn test_non_json_body_is_protocol_error_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/join-room"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server).request_token(&room("demo")).await;

    assert!(matches!(result, Err(ClientError::Protocol(_))));
}

#[tokio::test]
async fn test_error_status_is_protocol_error() {
    let server = MockServer::start().await;
    mount_join_room_response(&server, 500, r#"{"token": "leaked-secret"}"#).await;

    let result = client_for(&server).request_token(&room("demo")).await;

    match result {
        Err(ClientError::Protocol(detail)) => {
            assert!(detail.contains("500"));
            assert!(!detail.contains("leaked-secret"));
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Reserve a free port, then release it so connections are refused
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let mut config = ClientConfig::new(format!("http://{addr}"));
    config.connect_timeout = Duration::from_millis(500);
    let client = TokenClient::new(&config).unwrap();

    let result = client.request_token(&room("demo")).await;

    assert!(matches!(result, Err(ClientError::Network(_))));
}
