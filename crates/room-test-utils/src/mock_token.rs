//! Mock join-room endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! let server = MockServer::start().await;
//! mount_join_room(&server, "abc").await;
//! let config = ClientConfig::new(server.uri());
//! ```

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path served by the token endpoint.
pub const JOIN_ROOM_PATH: &str = "/join-room";

/// Answer every `POST /join-room` with `{"token": token}`.
pub async fn mount_join_room(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path(JOIN_ROOM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .mount(server)
        .await;
}

/// Answer every `POST /join-room` with a raw status and body.
pub async fn mount_join_room_response(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path(JOIN_ROOM_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Room names sent to the endpoint so far, in request order.
pub async fn requested_room_names(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == JOIN_ROOM_PATH)
        .filter_map(|request| serde_json::from_slice::<serde_json::Value>(&request.body).ok())
        .filter_map(|body| body.get("roomName")?.as_str().map(str::to_string))
        .collect()
}
