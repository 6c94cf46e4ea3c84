//! Participant and track fixtures.

use common::types::{ParticipantIdentity, TrackKind, TrackSid};
use room_client::media::{MediaTrack, Participant, TrackPublication};

/// Create a track with a fresh sid.
#[must_use]
pub fn track(kind: TrackKind) -> MediaTrack {
    MediaTrack::new(TrackSid::generate(), kind)
}

/// Create a publication whose track is already subscribed.
#[must_use]
pub fn subscribed_publication(kind: TrackKind) -> TrackPublication {
    TrackPublication::subscribed(track(kind), format!("{kind}-track"))
}

/// Create a publication that is not subscribed yet.
#[must_use]
pub fn pending_publication(kind: TrackKind) -> TrackPublication {
    TrackPublication::new(TrackSid::generate(), kind, format!("{kind}-track"))
}

/// Test participant builder.
#[derive(Debug, Clone)]
pub struct TestParticipant {
    identity: String,
    publications: Vec<TrackPublication>,
}

impl TestParticipant {
    /// Start a participant with no tracks.
    #[must_use]
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            publications: Vec::new(),
        }
    }

    /// Add a subscribed video track.
    #[must_use]
    pub fn with_video(self) -> Self {
        self.with_publication(subscribed_publication(TrackKind::Video))
    }

    /// Add a subscribed audio track.
    #[must_use]
    pub fn with_audio(self) -> Self {
        self.with_publication(subscribed_publication(TrackKind::Audio))
    }

    /// Add any publication.
    #[must_use]
    pub fn with_publication(mut self, publication: TrackPublication) -> Self {
        self.publications.push(publication);
        self
    }

    /// Build the participant with its publications in the order added.
    #[must_use]
    pub fn build(self) -> Participant {
        let participant = Participant::new(ParticipantIdentity::new(self.identity));
        for publication in self.publications {
            participant.publish(publication);
        }
        participant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_builder() {
        let bob = TestParticipant::new("bob")
            .with_video()
            .with_audio()
            .with_publication(pending_publication(TrackKind::Video))
            .build();

        assert_eq!(bob.identity().as_str(), "bob");
        assert_eq!(bob.publications().len(), 3);
        assert_eq!(bob.publications_of_kind(TrackKind::Video).len(), 2);
        assert!(bob
            .publications_of_kind(TrackKind::Audio)
            .iter()
            .all(TrackPublication::is_subscribed));
    }

    #[test]
    fn test_tracks_get_distinct_sids() {
        assert_ne!(track(TrackKind::Video).sid(), track(TrackKind::Video).sid());
    }
}
