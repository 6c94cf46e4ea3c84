//! # Room Client Test Utilities
//!
//! Mocks and fixtures for exercising the room client without a real media
//! service or token server.
//!
//! ## Modules
//!
//! - `mock_room` - Scriptable media service (`RoomConnector`) with a control handle
//! - `mock_token` - Join-room endpoint mounted on a `wiremock` server
//! - `fixtures` - Participant and track builders
//!
//! ## Usage
//!
//! ```rust,ignore
//! use room_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let server = MockServer::start().await;
//!     mount_join_room(&server, "abc").await;
//!
//!     let connector = MockRoomConnector::builder()
//!         .local(TestParticipant::new("alice").build())
//!         .build();
//!     let room = connector.room();
//!
//!     // Spawn the client, join, then drive the room through `room`...
//! }
//! ```

pub mod fixtures;
pub mod mock_room;
pub mod mock_token;

pub use fixtures::*;
pub use mock_room::*;
pub use mock_token::*;

use tracing_subscriber::EnvFilter;

/// Install a test log subscriber honoring `RUST_LOG`. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("room=debug")),
        )
        .with_test_writer()
        .try_init();
}
