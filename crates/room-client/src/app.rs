//! `RoomClient` - the page-level actor.
//!
//! Owns the room [`Session`], the [`ParticipantViewManager`] and the
//! [`ControlPanel`]. Everything that touches them runs on the actor task:
//! mailbox messages, join outcomes, room events and participant listener
//! events are handled one at a time in arrival order.
//!
//! # UI states
//!
//! ```text
//! Idle --join--> Joining --ok--> Connected --service disconnect / unload--> Disconnected
//!                   |                                                           |
//!                   +--error--> Failed <------------------ join again ---------+
//! ```
//!
//! `Failed` and `Disconnected` accept a new join. There is no automatic retry.

use crate::controls::ControlPanel;
use crate::errors::ClientError;
use crate::session::{RoomConnector, RoomEvent, Session};
use crate::token_client::TokenClient;
use crate::view::{ListenerEvent, ListenerKey, ParticipantViewManager, ViewSurface};

use common::types::RoomName;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default channel buffer size for the client mailbox.
const CLIENT_CHANNEL_BUFFER: usize = 64;

/// What the page is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiState {
    /// Join form, nothing attempted yet.
    Idle,
    /// Token request or room connect in flight.
    Joining { room: RoomName },
    /// In the room.
    Connected { room: RoomName },
    /// The last join failed; `message` is safe to show the user.
    Failed { message: String },
    /// Left the room or the service dropped it.
    Disconnected,
}

impl UiState {
    /// Whether the join form is shown.
    #[must_use]
    pub fn form_visible(&self) -> bool {
        matches!(
            self,
            UiState::Idle | UiState::Failed { .. } | UiState::Disconnected
        )
    }

    /// Whether the media controls are shown.
    #[must_use]
    pub fn controls_visible(&self) -> bool {
        !self.form_visible()
    }

    fn accepts_join(&self) -> bool {
        self.form_visible()
    }
}

/// Point-in-time view of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSnapshot {
    pub state: UiState,
    pub video_button: &'static str,
    pub audio_button: &'static str,
    pub form_visible: bool,
    pub controls_visible: bool,
}

/// Messages accepted by the `RoomClient` mailbox.
#[derive(Debug)]
pub enum RoomClientMessage {
    /// Join a room. Answered once the join succeeds or fails.
    Join {
        room_name: String,
        respond_to: oneshot::Sender<Result<(), ClientError>>,
    },
    /// Pause/resume local video. Answered with the new button label.
    ToggleVideo {
        respond_to: oneshot::Sender<&'static str>,
    },
    /// Mute/unmute local audio. Answered with the new button label.
    ToggleAudio {
        respond_to: oneshot::Sender<&'static str>,
    },
    /// Snapshot of the page.
    GetState {
        respond_to: oneshot::Sender<UiSnapshot>,
    },
    /// Leave the room and release every view binding.
    Unload { respond_to: oneshot::Sender<()> },
}

/// Result of a join attempt, sent back by the join task.
struct JoinOutcome {
    attempt: u64,
    result: Result<Session, ClientError>,
}

struct PendingJoin {
    attempt: u64,
    room: RoomName,
    respond_to: oneshot::Sender<Result<(), ClientError>>,
    task: JoinHandle<()>,
}

/// Handle to a `RoomClient`.
#[derive(Clone, Debug)]
pub struct RoomClientHandle {
    sender: mpsc::Sender<RoomClientMessage>,
    cancel_token: CancellationToken,
}

impl RoomClientHandle {
    /// Join a room and wait until the client is in it.
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidInput` if the room name is empty
    /// - `ClientError::InvalidState` while joining or already connected
    /// - `ClientError::Network` / `Protocol` if the token request fails
    /// - `ClientError::Connection` if the media service rejects the join
    /// - `ClientError::Stopped` if the actor is gone
    pub async fn join(&self, room_name: impl Into<String>) -> Result<(), ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomClientMessage::Join {
            room_name: room_name.into(),
            respond_to: tx,
        })
        .await?;

        rx.await.map_err(|_| ClientError::Stopped)?
    }

    /// Pause or resume local video, returning the new button label.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Stopped` if the actor is gone.
    pub async fn toggle_video(&self) -> Result<&'static str, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomClientMessage::ToggleVideo { respond_to: tx })
            .await?;
        rx.await.map_err(|_| ClientError::Stopped)
    }

    /// Mute or unmute local audio, returning the new button label.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Stopped` if the actor is gone.
    pub async fn toggle_audio(&self) -> Result<&'static str, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomClientMessage::ToggleAudio { respond_to: tx })
            .await?;
        rx.await.map_err(|_| ClientError::Stopped)
    }

    /// Get a snapshot of the page.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Stopped` if the actor is gone.
    pub async fn state(&self) -> Result<UiSnapshot, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomClientMessage::GetState { respond_to: tx })
            .await?;
        rx.await.map_err(|_| ClientError::Stopped)
    }

    /// Leave the room (page hide / before unload).
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Stopped` if the actor is gone.
    pub async fn unload(&self) -> Result<(), ClientError> {
        let (tx, rx) = oneshot::channel();
        self.send(RoomClientMessage::Unload { respond_to: tx })
            .await?;
        rx.await.map_err(|_| ClientError::Stopped)
    }

    /// Cancel the client actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    async fn send(&self, message: RoomClientMessage) -> Result<(), ClientError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| ClientError::Stopped)
    }
}

/// The `RoomClient` actor.
pub struct RoomClient<S> {
    token_client: TokenClient,
    connector: Arc<dyn RoomConnector>,
    receiver: mpsc::Receiver<RoomClientMessage>,
    join_tx: mpsc::UnboundedSender<JoinOutcome>,
    join_rx: mpsc::UnboundedReceiver<JoinOutcome>,
    cancel_token: CancellationToken,
    state: UiState,
    session: Option<Session>,
    views: ParticipantViewManager<S>,
    controls: ControlPanel,
    pending_join: Option<PendingJoin>,
    next_attempt: u64,
}

impl<S: ViewSurface + 'static> RoomClient<S> {
    /// Spawn a new client actor rendering into `surface`.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        token_client: TokenClient,
        connector: Arc<dyn RoomConnector>,
        surface: S,
        cancel_token: CancellationToken,
    ) -> (RoomClientHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(CLIENT_CHANNEL_BUFFER);
        let (join_tx, join_rx) = mpsc::unbounded_channel();

        let actor = Self {
            token_client,
            connector,
            receiver,
            join_tx,
            join_rx,
            cancel_token: cancel_token.clone(),
            state: UiState::Idle,
            session: None,
            views: ParticipantViewManager::new(surface),
            controls: ControlPanel::new(),
            pending_join: None,
            next_attempt: 0,
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = RoomClientHandle {
            sender,
            cancel_token,
        };

        (handle, task_handle)
    }

    /// Run the actor loop.
    #[instrument(skip_all, name = "room.client.actor")]
    async fn run(mut self) {
        debug!(target: "room.client", "RoomClient started");

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(target: "room.client", "RoomClient received cancellation signal");
                    self.unload();
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => self.handle_message(message),
                        None => {
                            debug!(target: "room.client", "RoomClient channel closed, exiting");
                            self.unload();
                            break;
                        }
                    }
                }

                Some(outcome) = self.join_rx.recv() => {
                    self.handle_join_outcome(outcome);
                }

                event = next_room_event(self.session.as_mut()) => {
                    self.handle_room_event(event);
                }

                (key, event) = next_listener_event(&mut self.views) => {
                    self.views.handle_event(key, event);
                }
            }
        }

        info!(target: "room.client", "RoomClient stopped");
    }

    fn handle_message(&mut self, message: RoomClientMessage) {
        match message {
            RoomClientMessage::Join {
                room_name,
                respond_to,
            } => self.start_join(&room_name, respond_to),

            RoomClientMessage::ToggleVideo { respond_to } => {
                self.controls.toggle_video(self.session.as_ref());
                let _ = respond_to.send(self.controls.video_label());
            }

            RoomClientMessage::ToggleAudio { respond_to } => {
                self.controls.toggle_audio(self.session.as_ref());
                let _ = respond_to.send(self.controls.audio_label());
            }

            RoomClientMessage::GetState { respond_to } => {
                let _ = respond_to.send(self.snapshot());
            }

            RoomClientMessage::Unload { respond_to } => {
                self.unload();
                let _ = respond_to.send(());
            }
        }
    }

    fn snapshot(&self) -> UiSnapshot {
        UiSnapshot {
            state: self.state.clone(),
            video_button: self.controls.video_label(),
            audio_button: self.controls.audio_label(),
            form_visible: self.state.form_visible(),
            controls_visible: self.state.controls_visible(),
        }
    }

    fn start_join(
        &mut self,
        room_name: &str,
        respond_to: oneshot::Sender<Result<(), ClientError>>,
    ) {
        if !self.state.accepts_join() {
            warn!(target: "room.client", state = ?self.state, "Join rejected in current state");
            let _ = respond_to.send(Err(ClientError::InvalidState(
                "Already joining or connected to a room".to_string(),
            )));
            return;
        }

        let room = match RoomName::parse(room_name) {
            Ok(room) => room,
            Err(e) => {
                debug!(target: "room.client", error = %e, "Join rejected, invalid room name");
                let _ = respond_to.send(Err(e.into()));
                return;
            }
        };

        self.next_attempt += 1;
        let attempt = self.next_attempt;

        info!(target: "room.client", room_name = %room, attempt, "Joining room");

        self.controls.reset();
        self.state = UiState::Joining { room: room.clone() };

        let token_client = self.token_client.clone();
        let connector = Arc::clone(&self.connector);
        let join_tx = self.join_tx.clone();
        let task_room = room.clone();

        let task = tokio::spawn(async move {
            let result: Result<Session, ClientError> = async {
                let token = token_client.request_token(&task_room).await?;
                Session::join(connector.as_ref(), task_room, &token).await
            }
            .await;

            // Receiver gone means the actor stopped; the session drops here.
            let _ = join_tx.send(JoinOutcome { attempt, result });
        });

        self.pending_join = Some(PendingJoin {
            attempt,
            room,
            respond_to,
            task,
        });
    }

    fn handle_join_outcome(&mut self, outcome: JoinOutcome) {
        let pending = match self.pending_join.take() {
            Some(pending) if pending.attempt == outcome.attempt => pending,
            other => {
                self.pending_join = other;
                debug!(
                    target: "room.client",
                    attempt = outcome.attempt,
                    "Discarding stale join outcome"
                );
                return;
            }
        };

        match outcome.result {
            Ok(session) => {
                self.enter_room(session);
                info!(target: "room.client", room_name = %pending.room, "Joined room");
                self.state = UiState::Connected { room: pending.room };
                let _ = pending.respond_to.send(Ok(()));
            }
            Err(e) => {
                warn!(target: "room.client", room_name = %pending.room, error = %e, "Join failed");
                self.state = UiState::Failed {
                    message: e.user_message(),
                };
                let _ = pending.respond_to.send(Err(e));
            }
        }
    }

    /// Attach the local participant, then everyone already in the room.
    fn enter_room(&mut self, session: Session) {
        let participants = std::iter::once(session.local_participant().clone())
            .chain(session.remote_participants());

        for participant in participants {
            if let Err(e) = self.views.attach(&participant) {
                warn!(
                    target: "room.client",
                    identity = %participant.identity(),
                    error = %e,
                    "Failed to attach participant"
                );
            }
        }

        self.session = Some(session);
    }

    fn handle_room_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::ParticipantConnected(participant) => {
                if let Err(e) = self.views.attach(&participant) {
                    warn!(
                        target: "room.client",
                        identity = %participant.identity(),
                        error = %e,
                        "Failed to attach participant"
                    );
                }
            }
            RoomEvent::ParticipantDisconnected(participant) => {
                self.views.detach(participant.identity());
            }
            RoomEvent::Disconnected { reason } => {
                info!(
                    target: "room.client",
                    reason = reason.as_deref().unwrap_or("none"),
                    "Room closed, releasing participant views"
                );
                self.views.detach_all();
                self.session = None;
                self.controls.reset();
                self.state = UiState::Disconnected;
            }
        }
    }

    /// Leave the room and release everything. Safe to call repeatedly.
    fn unload(&mut self) {
        if let Some(pending) = self.pending_join.take() {
            pending.task.abort();
            let _ = pending.respond_to.send(Err(ClientError::InvalidState(
                "Join cancelled".to_string(),
            )));
        }

        if let Some(mut session) = self.session.take() {
            session.disconnect();
        }

        self.views.detach_all();
        self.controls.reset();

        if self.state != UiState::Disconnected {
            debug!(target: "room.client", state = ?self.state, "Unloaded");
            self.state = UiState::Disconnected;
        }
    }
}

/// Next room event, or never if there is no live session.
async fn next_room_event(session: Option<&mut Session>) -> RoomEvent {
    if let Some(session) = session {
        if let Some(event) = session.next_event().await {
            return event;
        }
    }
    std::future::pending().await
}

/// Next participant listener event, or never if none are registered.
async fn next_listener_event<S: ViewSurface>(
    views: &mut ParticipantViewManager<S>,
) -> (ListenerKey, ListenerEvent) {
    match views.next_event().await {
        Some(item) => item,
        None => std::future::pending().await,
    }
}
