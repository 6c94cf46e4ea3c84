//! Participant, track publication and media track handles.
//!
//! These are the handles the media service hands to the client. Each one is a
//! cheap clone of shared state: the service side mutates it (`publish`,
//! `set_subscribed`) and the client reads it and listens for changes.
//!
//! Event sources are `tokio::sync::broadcast` channels. A listener is a
//! `broadcast::Receiver`; dropping it unregisters the listener, and the
//! `*_listener_count` accessors report how many are still registered.

use common::types::{ParticipantIdentity, TrackKind, TrackSid};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Capacity of each per-handle event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Rendered element produced by [`MediaTrack::attach`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaElement {
    /// Element kind, `audio` or `video`.
    pub kind: TrackKind,
    /// Track rendered by this element.
    pub track_sid: TrackSid,
}

// ----------------------------------------------------------------------------
// MediaTrack
// ----------------------------------------------------------------------------

struct TrackInner {
    sid: TrackSid,
    kind: TrackKind,
    enabled: watch::Sender<bool>,
}

/// Handle to one audio or video track.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    /// Create an enabled track.
    #[must_use]
    pub fn new(sid: TrackSid, kind: TrackKind) -> Self {
        let (enabled, _) = watch::channel(true);
        Self {
            inner: Arc::new(TrackInner { sid, kind, enabled }),
        }
    }

    /// Get the track sid.
    #[must_use]
    pub fn sid(&self) -> &TrackSid {
        &self.inner.sid
    }

    /// Get the track kind.
    #[must_use]
    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    /// Whether the track is currently enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        *self.inner.enabled.borrow()
    }

    /// Enable or disable the track.
    pub fn enable(&self, enabled: bool) {
        self.inner.enabled.send_replace(enabled);
    }

    /// Watch the enabled flag (used by the service to apply changes).
    #[must_use]
    pub fn watch_enabled(&self) -> watch::Receiver<bool> {
        self.inner.enabled.subscribe()
    }

    /// Create the rendered element for this track.
    #[must_use]
    pub fn attach(&self) -> MediaElement {
        MediaElement {
            kind: self.inner.kind,
            track_sid: self.inner.sid.clone(),
        }
    }
}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("sid", &self.inner.sid)
            .field("kind", &self.inner.kind)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// TrackPublication
// ----------------------------------------------------------------------------

struct PublicationInner {
    sid: TrackSid,
    kind: TrackKind,
    name: String,
    track: watch::Sender<Option<MediaTrack>>,
    subscribed: broadcast::Sender<MediaTrack>,
}

/// A track a participant has published.
///
/// The media track is present only once the local side is subscribed.
#[derive(Clone)]
pub struct TrackPublication {
    inner: Arc<PublicationInner>,
}

impl TrackPublication {
    /// Create a publication that is not yet subscribed.
    #[must_use]
    pub fn new(sid: TrackSid, kind: TrackKind, name: impl Into<String>) -> Self {
        let (track, _) = watch::channel(None);
        let (subscribed, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(PublicationInner {
                sid,
                kind,
                name: name.into(),
                track,
                subscribed,
            }),
        }
    }

    /// Create a publication whose track is already subscribed.
    ///
    /// Local publications are always created this way.
    #[must_use]
    pub fn subscribed(track: MediaTrack, name: impl Into<String>) -> Self {
        let publication = Self::new(track.sid().clone(), track.kind(), name);
        publication.inner.track.send_replace(Some(track));
        publication
    }

    /// Get the track sid.
    #[must_use]
    pub fn sid(&self) -> &TrackSid {
        &self.inner.sid
    }

    /// Get the track kind.
    #[must_use]
    pub fn kind(&self) -> TrackKind {
        self.inner.kind
    }

    /// Get the track name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the subscribed track, if any.
    #[must_use]
    pub fn track(&self) -> Option<MediaTrack> {
        self.inner.track.borrow().clone()
    }

    /// Whether the local side is subscribed to this track.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.inner.track.borrow().is_some()
    }

    /// Register a listener for the `subscribed` event.
    #[must_use]
    pub fn on_subscribed(&self) -> broadcast::Receiver<MediaTrack> {
        self.inner.subscribed.subscribe()
    }

    /// Number of registered `subscribed` listeners.
    #[must_use]
    pub fn subscribed_listener_count(&self) -> usize {
        self.inner.subscribed.receiver_count()
    }

    /// Mark the publication subscribed and notify listeners (service side).
    pub fn set_subscribed(&self, track: MediaTrack) {
        self.inner.track.send_replace(Some(track.clone()));
        // No listeners is not an error
        let _ = self.inner.subscribed.send(track);
    }
}

impl fmt::Debug for TrackPublication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackPublication")
            .field("sid", &self.inner.sid)
            .field("kind", &self.inner.kind)
            .field("name", &self.inner.name)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Participant
// ----------------------------------------------------------------------------

struct ParticipantInner {
    identity: ParticipantIdentity,
    publications: watch::Sender<Vec<TrackPublication>>,
    track_published: broadcast::Sender<TrackPublication>,
}

/// A local or remote endpoint in a room.
#[derive(Clone)]
pub struct Participant {
    inner: Arc<ParticipantInner>,
}

impl Participant {
    /// Create a participant with no publications.
    #[must_use]
    pub fn new(identity: ParticipantIdentity) -> Self {
        let (publications, _) = watch::channel(Vec::new());
        let (track_published, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(ParticipantInner {
                identity,
                publications,
                track_published,
            }),
        }
    }

    /// Get the participant identity.
    #[must_use]
    pub fn identity(&self) -> &ParticipantIdentity {
        &self.inner.identity
    }

    /// Snapshot of current publications, in publish order.
    #[must_use]
    pub fn publications(&self) -> Vec<TrackPublication> {
        self.inner.publications.borrow().clone()
    }

    /// Snapshot of current publications of one kind, in publish order.
    #[must_use]
    pub fn publications_of_kind(&self, kind: TrackKind) -> Vec<TrackPublication> {
        self.inner
            .publications
            .borrow()
            .iter()
            .filter(|p| p.kind() == kind)
            .cloned()
            .collect()
    }

    /// Register a listener for the `trackPublished` event.
    #[must_use]
    pub fn on_track_published(&self) -> broadcast::Receiver<TrackPublication> {
        self.inner.track_published.subscribe()
    }

    /// Number of registered `trackPublished` listeners.
    #[must_use]
    pub fn track_published_listener_count(&self) -> usize {
        self.inner.track_published.receiver_count()
    }

    /// Add a publication and notify listeners (service side).
    pub fn publish(&self, publication: TrackPublication) {
        self.inner
            .publications
            .send_modify(|pubs| pubs.push(publication.clone()));
        let _ = self.inner.track_published.send(publication);
    }
}

impl fmt::Debug for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("identity", &self.inner.identity)
            .field("publications", &self.inner.publications.borrow().len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn video_track(sid: &str) -> MediaTrack {
        MediaTrack::new(TrackSid::from(sid), TrackKind::Video)
    }

    #[test]
    fn test_track_enable_toggles_and_notifies_watchers() {
        let track = video_track("MT1");
        let watcher = track.watch_enabled();
        assert!(track.is_enabled());

        track.enable(false);

        assert!(!track.is_enabled());
        assert!(!*watcher.borrow());
    }

    #[test]
    fn test_track_attach_matches_kind() {
        let element = MediaTrack::new(TrackSid::from("MT2"), TrackKind::Audio).attach();
        assert_eq!(element.kind, TrackKind::Audio);
        assert_eq!(element.track_sid, TrackSid::from("MT2"));
    }

    #[test]
    fn test_clones_share_state() {
        let track = video_track("MT3");
        let clone = track.clone();
        clone.enable(false);
        assert!(!track.is_enabled());
    }

    #[tokio::test]
    async fn test_publication_subscribed_event() {
        let publication = TrackPublication::new(TrackSid::from("MT4"), TrackKind::Video, "camera");
        assert!(!publication.is_subscribed());

        let mut listener = publication.on_subscribed();
        assert_eq!(publication.subscribed_listener_count(), 1);

        publication.set_subscribed(video_track("MT4"));

        let track = listener.recv().await.unwrap();
        assert_eq!(track.sid(), &TrackSid::from("MT4"));
        assert!(publication.is_subscribed());

        drop(listener);
        assert_eq!(publication.subscribed_listener_count(), 0);
    }

    #[test]
    fn test_set_subscribed_without_listeners_is_ok() {
        let publication = TrackPublication::new(TrackSid::from("MT5"), TrackKind::Audio, "mic");
        publication.set_subscribed(MediaTrack::new(TrackSid::from("MT5"), TrackKind::Audio));
        assert!(publication.track().is_some());
    }

    #[tokio::test]
    async fn test_participant_publish_updates_snapshot_and_notifies() {
        let participant = Participant::new(ParticipantIdentity::from("bob"));
        let mut listener = participant.on_track_published();

        participant.publish(TrackPublication::subscribed(video_track("MT6"), "camera"));
        participant.publish(TrackPublication::new(
            TrackSid::from("MT7"),
            TrackKind::Audio,
            "mic",
        ));

        assert_eq!(participant.publications().len(), 2);
        assert_eq!(participant.publications_of_kind(TrackKind::Video).len(), 1);
        assert_eq!(participant.publications_of_kind(TrackKind::Audio).len(), 1);

        let first = listener.recv().await.unwrap();
        assert_eq!(first.sid(), &TrackSid::from("MT6"));
        let second = listener.recv().await.unwrap();
        assert_eq!(second.sid(), &TrackSid::from("MT7"));
    }
}
