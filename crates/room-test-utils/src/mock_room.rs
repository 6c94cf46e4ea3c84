//! Mock media service for room client testing.
//!
//! Provides a `RoomConnector` that can be configured to:
//! - Accept or reject connects, scripted per call
//! - Return a given local participant and preset remote participants
//! - Emit room events on demand through a [`MockRoom`] handle
//!
//! # Example
//!
//! ```rust,ignore
//! use room_test_utils::{MockRoomConnector, TestParticipant};
//!
//! let connector = MockRoomConnector::builder()
//!     .reject_next(20101, "Invalid Access Token")
//!     .local(TestParticipant::new("alice").with_video().build())
//!     .remote(TestParticipant::new("bob").build())
//!     .build();
//! let room = connector.room();
//!
//! // First connect fails, the next one succeeds.
//! ```

use async_trait::async_trait;
use common::secret::AccessToken;
use common::types::{ParticipantIdentity, RoomName};
use room_client::errors::ConnectError;
use room_client::media::Participant;
use room_client::session::{ConnectedRoom, RoomConnector, RoomEvent, RoomLink};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

#[derive(Debug)]
struct MockState {
    local: Participant,
    remotes: Vec<Participant>,
    scripted_failures: VecDeque<Option<ConnectError>>,
    events: Option<mpsc::UnboundedSender<RoomEvent>>,
    call_count: usize,
    disconnect_count: usize,
    last_token: Option<String>,
    last_room_name: Option<String>,
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> MutexGuard<'_, MockState> {
    state.lock().expect("mock room state lock poisoned")
}

/// Mock media service.
#[derive(Debug, Clone)]
pub struct MockRoomConnector {
    state: Shared,
}

impl MockRoomConnector {
    /// Create a new `MockRoomConnector` builder.
    #[must_use]
    pub fn builder() -> MockRoomConnectorBuilder {
        MockRoomConnectorBuilder::default()
    }

    /// Control handle for the room this connector serves.
    #[must_use]
    pub fn room(&self) -> MockRoom {
        MockRoom {
            state: Arc::clone(&self.state),
        }
    }

    /// Number of connect attempts so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.state).call_count
    }
}

#[async_trait]
impl RoomConnector for MockRoomConnector {
    async fn connect(
        &self,
        token: &AccessToken,
        room_name: &RoomName,
    ) -> Result<ConnectedRoom, ConnectError> {
        let mut state = lock(&self.state);
        state.call_count += 1;
        state.last_token = Some(token.expose().to_string());
        state.last_room_name = Some(room_name.as_str().to_string());

        if let Some(Some(error)) = state.scripted_failures.pop_front() {
            return Err(error);
        }

        let (tx, events) = mpsc::unbounded_channel();
        state.events = Some(tx);

        Ok(ConnectedRoom {
            local_participant: state.local.clone(),
            participants: state.remotes.clone(),
            events,
            link: Box::new(MockLink {
                state: Arc::clone(&self.state),
            }),
        })
    }
}

/// Counts teardown calls and closes the event feed.
struct MockLink {
    state: Shared,
}

impl RoomLink for MockLink {
    fn disconnect(&mut self) -> Result<(), String> {
        let mut state = lock(&self.state);
        state.disconnect_count += 1;
        state.events = None;
        Ok(())
    }
}

/// Service-side control of the mock room.
#[derive(Debug, Clone)]
pub struct MockRoom {
    state: Shared,
}

impl MockRoom {
    /// The local participant handed to the client.
    #[must_use]
    pub fn local_participant(&self) -> Participant {
        lock(&self.state).local.clone()
    }

    /// Remote participants handed to the client at connect.
    #[must_use]
    pub fn remote_participants(&self) -> Vec<Participant> {
        lock(&self.state).remotes.clone()
    }

    /// Whether a client currently holds an open event feed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        lock(&self.state).events.is_some()
    }

    /// Number of `RoomLink::disconnect` calls.
    #[must_use]
    pub fn disconnect_count(&self) -> usize {
        lock(&self.state).disconnect_count
    }

    /// Token presented on the last connect.
    #[must_use]
    pub fn last_token(&self) -> Option<String> {
        lock(&self.state).last_token.clone()
    }

    /// Room name presented on the last connect.
    #[must_use]
    pub fn last_room_name(&self) -> Option<String> {
        lock(&self.state).last_room_name.clone()
    }

    /// Announce that a remote participant joined.
    pub fn participant_connected(&self, participant: &Participant) {
        self.emit(RoomEvent::ParticipantConnected(participant.clone()));
    }

    /// Announce that a remote participant left.
    pub fn participant_disconnected(&self, participant: &Participant) {
        self.emit(RoomEvent::ParticipantDisconnected(participant.clone()));
    }

    /// Drop the client from the room.
    pub fn end(&self, reason: Option<&str>) {
        self.emit(RoomEvent::Disconnected {
            reason: reason.map(str::to_string),
        });
    }

    /// Close the event feed without a `Disconnected` event (transport loss).
    pub fn close_feed(&self) {
        lock(&self.state).events = None;
    }

    /// Participant with `identity` among the connect-time remotes.
    #[must_use]
    pub fn remote(&self, identity: &str) -> Option<Participant> {
        let identity = ParticipantIdentity::from(identity);
        lock(&self.state)
            .remotes
            .iter()
            .find(|p| p.identity() == &identity)
            .cloned()
    }

    fn emit(&self, event: RoomEvent) {
        let state = lock(&self.state);
        let sender = state
            .events
            .as_ref()
            .expect("mock room has no connected client");
        sender.send(event).expect("client dropped the room event feed");
    }
}

/// Builder for `MockRoomConnector` configuration.
#[derive(Debug, Default)]
pub struct MockRoomConnectorBuilder {
    local: Option<Participant>,
    remotes: Vec<Participant>,
    scripted_failures: VecDeque<Option<ConnectError>>,
}

impl MockRoomConnectorBuilder {
    /// Set the local participant (default: `alice` with no tracks).
    #[must_use]
    pub fn local(mut self, participant: Participant) -> Self {
        self.local = Some(participant);
        self
    }

    /// Add a remote participant present at connect.
    #[must_use]
    pub fn remote(mut self, participant: Participant) -> Self {
        self.remotes.push(participant);
        self
    }

    /// Append a successful connect to the script.
    #[must_use]
    pub fn accept_next(mut self) -> Self {
        self.scripted_failures.push_back(None);
        self
    }

    /// Append a failing connect to the script.
    #[must_use]
    pub fn reject_next(mut self, code: u32, message: impl Into<String>) -> Self {
        self.scripted_failures
            .push_back(Some(ConnectError::new(code, message)));
        self
    }

    /// Build the `MockRoomConnector`. Connects past the script succeed.
    #[must_use]
    pub fn build(self) -> MockRoomConnector {
        let local = self
            .local
            .unwrap_or_else(|| Participant::new(ParticipantIdentity::from("alice")));

        MockRoomConnector {
            state: Arc::new(Mutex::new(MockState {
                local,
                remotes: self.remotes,
                scripted_failures: self.scripted_failures,
                events: None,
                call_count: 0,
                disconnect_count: 0,
                last_token: None,
                last_room_name: None,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestParticipant;

    #[tokio::test]
    async fn test_scripted_connects() {
        let connector = MockRoomConnector::builder()
            .reject_next(20101, "Invalid Access Token")
            .accept_next()
            .remote(TestParticipant::new("bob").build())
            .build();
        let room = connector.room();
        let demo = RoomName::parse("demo").unwrap();

        let err = connector
            .connect(&AccessToken::from("bad"), &demo)
            .await
            .unwrap_err();
        assert_eq!(err.code, 20101);
        assert!(!room.is_connected());

        let connected = connector
            .connect(&AccessToken::from("abc"), &demo)
            .await
            .unwrap();
        assert_eq!(connected.local_participant.identity().as_str(), "alice");
        assert_eq!(connected.participants.len(), 1);
        assert!(room.is_connected());

        assert_eq!(connector.call_count(), 2);
        assert_eq!(room.last_token().as_deref(), Some("abc"));
        assert_eq!(room.last_room_name().as_deref(), Some("demo"));
    }

    #[tokio::test]
    async fn test_events_and_disconnect() {
        let connector = MockRoomConnector::builder().build();
        let room = connector.room();

        let mut connected = connector
            .connect(
                &AccessToken::from("abc"),
                &RoomName::parse("demo").unwrap(),
            )
            .await
            .unwrap();

        let carol = TestParticipant::new("carol").build();
        room.participant_connected(&carol);
        assert!(matches!(
            connected.events.recv().await,
            Some(RoomEvent::ParticipantConnected(p)) if p.identity().as_str() == "carol"
        ));

        connected.link.disconnect().unwrap();
        assert_eq!(room.disconnect_count(), 1);
        assert!(!room.is_connected());
        assert!(connected.events.recv().await.is_none());
    }
}
