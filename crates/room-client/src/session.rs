//! Room session: one connection to a room on the media service.
//!
//! # State machine
//!
//! ```text
//! Connecting --ok--> Connected --disconnect / transport loss--> Disconnected
//!     |                                                              ^
//!     +------------------------- join failure -----------------------+
//! ```
//!
//! `Disconnected` is terminal. A failed join never produces a [`Session`];
//! the caller gets `ClientError::Connection` instead.

use crate::errors::{ClientError, ConnectError};
use crate::media::Participant;

use async_trait::async_trait;
use common::secret::AccessToken;
use common::types::{ParticipantIdentity, RoomName};
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Lifecycle events delivered by the media service, in arrival order.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// A remote participant joined.
    ParticipantConnected(Participant),
    /// A remote participant left.
    ParticipantDisconnected(Participant),
    /// The service dropped the room connection.
    Disconnected { reason: Option<String> },
}

/// Capability to tear down a live room connection.
pub trait RoomLink: Send {
    /// Release the connection and every service-side subscription.
    ///
    /// # Errors
    ///
    /// Returns a service-supplied description when teardown fails. Callers
    /// log it and move on.
    fn disconnect(&mut self) -> Result<(), String>;
}

/// Everything the media service returns for a successful connect.
pub struct ConnectedRoom {
    /// The caller's own participant.
    pub local_participant: Participant,
    /// Participants already in the room.
    pub participants: Vec<Participant>,
    /// Lifecycle event feed.
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
    /// Teardown capability.
    pub link: Box<dyn RoomLink>,
}

impl fmt::Debug for ConnectedRoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectedRoom")
            .field("local_participant", &self.local_participant)
            .field("participants", &self.participants.len())
            .finish_non_exhaustive()
    }
}

/// Connect operation of the media service (enables mocking).
#[async_trait]
pub trait RoomConnector: Send + Sync {
    /// Connect to a room with an access token.
    async fn connect(
        &self,
        token: &AccessToken,
        room_name: &RoomName,
    ) -> Result<ConnectedRoom, ConnectError>;
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// `disconnect()` was called.
    Local,
    /// The service reported a disconnect.
    Remote(Option<String>),
    /// The service's event feed closed.
    TransportClosed,
}

/// Session lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected,
    Disconnected(DisconnectReason),
}

/// One active connection to a room.
pub struct Session {
    room_name: RoomName,
    local: Participant,
    /// Connected remote participants in arrival order.
    remotes: Vec<Participant>,
    events: mpsc::UnboundedReceiver<RoomEvent>,
    link: Box<dyn RoomLink>,
    state: SessionState,
}

impl Session {
    /// Connect to a room.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` with the service's error details if
    /// authentication or negotiation fails.
    #[instrument(skip_all, name = "room.session.join", fields(room_name = %room_name))]
    pub async fn join<C>(
        connector: &C,
        room_name: RoomName,
        token: &AccessToken,
    ) -> Result<Self, ClientError>
    where
        C: RoomConnector + ?Sized,
    {
        debug!(target: "room.session", state = ?SessionState::Connecting, "Connecting to room");

        let connected = connector.connect(token, &room_name).await.map_err(|e| {
            warn!(
                target: "room.session",
                code = e.code,
                error = %e.message,
                "Room connection failed"
            );
            ClientError::Connection(e)
        })?;

        let remotes = connected.participants;

        info!(
            target: "room.session",
            local_identity = %connected.local_participant.identity(),
            remote_participants = remotes.len(),
            "Connected to room"
        );

        Ok(Self {
            room_name,
            local: connected.local_participant,
            remotes,
            events: connected.events,
            link: connected.link,
            state: SessionState::Connected,
        })
    }

    /// Get the room name.
    #[must_use]
    pub fn room_name(&self) -> &RoomName {
        &self.room_name
    }

    /// Get the local participant.
    #[must_use]
    pub fn local_participant(&self) -> &Participant {
        &self.local
    }

    /// Currently connected remote participants, in arrival order.
    #[must_use]
    pub fn remote_participants(&self) -> Vec<Participant> {
        self.remotes.clone()
    }

    fn remove_remote(&mut self, identity: &ParticipantIdentity) {
        self.remotes.retain(|p| p.identity() != identity);
    }

    /// Get the current state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the session is still connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Wait for the next lifecycle event.
    ///
    /// Keeps the remote participant map current. Returns `None` once the
    /// session is disconnected; the last event before that is always
    /// `RoomEvent::Disconnected`.
    pub async fn next_event(&mut self) -> Option<RoomEvent> {
        if !self.is_connected() {
            return None;
        }

        let Some(event) = self.events.recv().await else {
            warn!(target: "room.session", "Room event feed closed");
            self.state = SessionState::Disconnected(DisconnectReason::TransportClosed);
            return Some(RoomEvent::Disconnected {
                reason: Some("event feed closed".to_string()),
            });
        };

        match &event {
            RoomEvent::ParticipantConnected(participant) => {
                debug!(
                    target: "room.session",
                    identity = %participant.identity(),
                    "Participant connected"
                );
                self.remove_remote(participant.identity());
                self.remotes.push(participant.clone());
            }
            RoomEvent::ParticipantDisconnected(participant) => {
                debug!(
                    target: "room.session",
                    identity = %participant.identity(),
                    "Participant disconnected"
                );
                self.remove_remote(participant.identity());
            }
            RoomEvent::Disconnected { reason } => {
                info!(
                    target: "room.session",
                    reason = reason.as_deref().unwrap_or("none"),
                    "Room disconnected by service"
                );
                self.state = SessionState::Disconnected(DisconnectReason::Remote(reason.clone()));
                self.remotes.clear();
            }
        }

        Some(event)
    }

    /// Disconnect from the room.
    ///
    /// Idempotent and infallible: teardown errors are logged, never returned.
    pub fn disconnect(&mut self) {
        if !self.is_connected() {
            return;
        }

        if let Err(e) = self.link.disconnect() {
            warn!(target: "room.session", error = %e, "Error during room disconnect, ignoring");
        }

        self.state = SessionState::Disconnected(DisconnectReason::Local);
        self.remotes.clear();

        info!(target: "room.session", room_name = %self.room_name, "Disconnected from room");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("room_name", &self.room_name)
            .field("local", &self.local)
            .field("remotes", &self.remotes.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
