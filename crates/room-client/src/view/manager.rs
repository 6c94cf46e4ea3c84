//! Participant view manager.
//!
//! Owns one [`ViewBinding`] per participant identity: the participant's
//! container on the view surface plus the exact set of listeners registered
//! for it. Listener streams live in a single keyed [`StreamMap`], so the
//! owner drives every participant's events from one `next_event()` call and
//! processes them one at a time.
//!
//! # Invariants
//!
//! - At most one binding per identity.
//! - A publication is rendered at most once per binding.
//! - `detach` removes the binding's listeners before its container, and
//!   events for identities without a binding are dropped. Removing a key from
//!   the stream map drops the underlying broadcast receiver immediately, so a
//!   late `subscribed` event can never reach a removed container.
//! - A listener that lags behind its channel triggers a resync from the
//!   participant's current publications, so dropped events are not lost.

use crate::errors::ViewError;
use crate::media::{MediaTrack, Participant, TrackPublication};
use crate::view::surface::ViewSurface;

use common::types::{ParticipantIdentity, TrackSid};
use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt, StreamMap};
use tracing::{debug, info, warn};

type ListenerStream = Pin<Box<dyn Stream<Item = ListenerEvent> + Send>>;

/// Identifies one registered listener.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListenerKey {
    /// `trackPublished` on a participant.
    TrackPublished(ParticipantIdentity),
    /// One-time `subscribed` on one of a participant's publications.
    Subscribed(ParticipantIdentity, TrackSid),
}

impl ListenerKey {
    /// Identity of the participant that owns this listener.
    #[must_use]
    pub fn identity(&self) -> &ParticipantIdentity {
        match self {
            ListenerKey::TrackPublished(identity) | ListenerKey::Subscribed(identity, _) => {
                identity
            }
        }
    }
}

/// Event delivered by a registered listener.
#[derive(Debug, Clone)]
pub enum ListenerEvent {
    TrackPublished(TrackPublication),
    Subscribed(MediaTrack),
    /// The listener fell behind and `skipped` events were dropped.
    Lagged { skipped: u64 },
}

#[derive(Debug)]
struct ViewBinding {
    participant: Participant,
    listeners: HashSet<ListenerKey>,
    seen_publications: HashSet<TrackSid>,
    rendered_tracks: HashSet<TrackSid>,
}

impl ViewBinding {
    fn new(participant: Participant) -> Self {
        Self {
            participant,
            listeners: HashSet::new(),
            seen_publications: HashSet::new(),
            rendered_tracks: HashSet::new(),
        }
    }
}

fn listener_stream<T>(
    receiver: broadcast::Receiver<T>,
    wrap: fn(T) -> ListenerEvent,
) -> ListenerStream
where
    T: Clone + Send + 'static,
{
    Box::pin(BroadcastStream::new(receiver).map(move |item| match item {
        Ok(value) => wrap(value),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => ListenerEvent::Lagged { skipped },
    }))
}

/// Keeps each participant's container in sync with its media tracks.
pub struct ParticipantViewManager<S> {
    surface: S,
    bindings: HashMap<ParticipantIdentity, ViewBinding>,
    listeners: StreamMap<ListenerKey, ListenerStream>,
}

impl<S: ViewSurface> ParticipantViewManager<S> {
    /// Create a manager rendering into `surface`.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            bindings: HashMap::new(),
            listeners: StreamMap::new(),
        }
    }

    /// Get the view surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Number of live bindings.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Whether a participant has a binding.
    pub fn is_attached(&self, identity: &ParticipantIdentity) -> bool {
        self.bindings.contains_key(identity)
    }

    /// Number of registered listeners across all bindings.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Create a binding and container for a participant and render its tracks.
    ///
    /// Re-attaching an identity releases the previous binding first.
    ///
    /// # Errors
    ///
    /// Returns the surface error if the container cannot be created; no
    /// binding is kept in that case.
    pub fn attach(&mut self, participant: &Participant) -> Result<(), ViewError> {
        let identity = participant.identity().clone();

        if self.bindings.contains_key(&identity) {
            warn!(
                target: "room.view",
                identity = %identity,
                "Participant already attached, replacing binding"
            );
            self.detach(&identity);
        }

        self.surface.create_container(&identity)?;
        self.bindings
            .insert(identity.clone(), ViewBinding::new(participant.clone()));

        self.register(
            ListenerKey::TrackPublished(identity.clone()),
            listener_stream(participant.on_track_published(), ListenerEvent::TrackPublished),
        );

        let publications = participant.publications();
        for publication in &publications {
            self.render(&identity, publication);
        }

        info!(
            target: "room.view",
            identity = %identity,
            publications = publications.len(),
            "Participant attached"
        );
        Ok(())
    }

    /// Release a participant's listeners, then remove its container.
    ///
    /// Returns `false` if the identity had no binding.
    pub fn detach(&mut self, identity: &ParticipantIdentity) -> bool {
        let Some(binding) = self.bindings.remove(identity) else {
            warn!(target: "room.view", identity = %identity, "Detach for unknown participant");
            return false;
        };

        for key in &binding.listeners {
            self.listeners.remove(key);
        }

        if let Err(e) = self.surface.remove_container(identity) {
            warn!(target: "room.view", identity = %identity, error = %e, "Failed to remove container");
        }

        info!(
            target: "room.view",
            identity = %identity,
            listeners_released = binding.listeners.len(),
            "Participant detached"
        );
        true
    }

    /// Release every binding.
    pub fn detach_all(&mut self) {
        let identities: Vec<_> = self.bindings.keys().cloned().collect();
        for identity in identities {
            self.detach(&identity);
        }
    }

    /// Wait for the next listener event from any binding.
    ///
    /// Returns `None` immediately when no listeners are registered.
    pub async fn next_event(&mut self) -> Option<(ListenerKey, ListenerEvent)> {
        self.listeners.next().await
    }

    /// Apply one listener event.
    pub fn handle_event(&mut self, key: ListenerKey, event: ListenerEvent) {
        let identity = key.identity().clone();
        match event {
            ListenerEvent::TrackPublished(publication) => {
                debug!(
                    target: "room.view",
                    identity = %identity,
                    track_sid = %publication.sid(),
                    kind = %publication.kind(),
                    "Track published"
                );
                self.render(&identity, &publication);
            }
            ListenerEvent::Subscribed(track) => {
                self.unregister(&key);
                debug!(
                    target: "room.view",
                    identity = %identity,
                    track_sid = %track.sid(),
                    "Track subscribed"
                );
                self.display(&identity, &track);
            }
            ListenerEvent::Lagged { skipped } => {
                warn!(
                    target: "room.view",
                    identity = %identity,
                    skipped,
                    "Listener lagged, resyncing from publications"
                );
                self.resync(&identity);
            }
        }
    }

    /// Bring a binding up to date with its participant's publications.
    fn resync(&mut self, identity: &ParticipantIdentity) {
        let Some(participant) = self.bindings.get(identity).map(|b| b.participant.clone()) else {
            return;
        };

        for publication in participant.publications() {
            let seen = self
                .bindings
                .get(identity)
                .is_some_and(|b| b.seen_publications.contains(publication.sid()));

            if !seen {
                self.render(identity, &publication);
            } else if let Some(track) = publication.track() {
                self.unregister(&ListenerKey::Subscribed(
                    identity.clone(),
                    publication.sid().clone(),
                ));
                self.display(identity, &track);
            }
        }
    }

    /// Render a publication now if subscribed, otherwise once it is.
    fn render(&mut self, identity: &ParticipantIdentity, publication: &TrackPublication) {
        let Some(binding) = self.bindings.get_mut(identity) else {
            debug!(target: "room.view", identity = %identity, "No binding, ignoring publication");
            return;
        };

        if !binding.seen_publications.insert(publication.sid().clone()) {
            return;
        }

        // Listen before checking, so a subscription landing in between is seen
        // through `track()` rather than lost.
        let receiver = publication.on_subscribed();

        match publication.track() {
            Some(track) => {
                drop(receiver);
                self.display(identity, &track);
            }
            None => {
                self.register(
                    ListenerKey::Subscribed(identity.clone(), publication.sid().clone()),
                    listener_stream(receiver, ListenerEvent::Subscribed),
                );
            }
        }
    }

    fn display(&mut self, identity: &ParticipantIdentity, track: &MediaTrack) {
        let Some(binding) = self.bindings.get_mut(identity) else {
            debug!(target: "room.view", identity = %identity, "No binding, ignoring track");
            return;
        };

        if !binding.rendered_tracks.insert(track.sid().clone()) {
            return;
        }

        if let Err(e) = self.surface.append_element(identity, track.attach()) {
            warn!(target: "room.view", identity = %identity, error = %e, "Failed to attach track");
        }
    }

    fn register(&mut self, key: ListenerKey, stream: ListenerStream) {
        if let Some(binding) = self.bindings.get_mut(key.identity()) {
            binding.listeners.insert(key.clone());
            self.listeners.insert(key, stream);
        }
    }

    fn unregister(&mut self, key: &ListenerKey) {
        self.listeners.remove(key);
        if let Some(binding) = self.bindings.get_mut(key.identity()) {
            binding.listeners.remove(key);
        }
    }
}
