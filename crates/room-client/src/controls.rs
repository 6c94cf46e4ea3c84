//! Control panel: pause/resume local video, mute/unmute local audio.
//!
//! Each toggle assumes the local participant publishes exactly one track of
//! its kind. With zero or several such tracks the toggle does nothing.

use crate::media::MediaTrack;
use crate::session::Session;

use common::types::TrackKind;
use tracing::{debug, info, warn};

pub const PAUSE_VIDEO: &str = "Pause Video";
pub const RESUME_VIDEO: &str = "Resume Video";
pub const MUTE_AUDIO: &str = "Mute Audio";
pub const UNMUTE_AUDIO: &str = "Unmute Audio";

/// Button labels for the two toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlPanel {
    video_label: &'static str,
    audio_label: &'static str,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            video_label: PAUSE_VIDEO,
            audio_label: MUTE_AUDIO,
        }
    }
}

impl ControlPanel {
    /// Create a panel with the initial labels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current video button label.
    #[must_use]
    pub fn video_label(&self) -> &'static str {
        self.video_label
    }

    /// Current audio button label.
    #[must_use]
    pub fn audio_label(&self) -> &'static str {
        self.audio_label
    }

    /// Pause or resume the local video track.
    ///
    /// Returns `true` if the track was toggled.
    pub fn toggle_video(&mut self, session: Option<&Session>) -> bool {
        let Some(track) = single_local_track(session, TrackKind::Video) else {
            return false;
        };

        track.enable(!track.is_enabled());
        self.video_label = if track.is_enabled() {
            PAUSE_VIDEO
        } else {
            RESUME_VIDEO
        };

        info!(target: "room.controls", enabled = track.is_enabled(), "Local video toggled");
        true
    }

    /// Mute or unmute the local audio track.
    ///
    /// Returns `true` if the track was toggled.
    pub fn toggle_audio(&mut self, session: Option<&Session>) -> bool {
        let Some(track) = single_local_track(session, TrackKind::Audio) else {
            return false;
        };

        track.enable(!track.is_enabled());
        self.audio_label = if track.is_enabled() {
            MUTE_AUDIO
        } else {
            UNMUTE_AUDIO
        };

        info!(target: "room.controls", enabled = track.is_enabled(), "Local audio toggled");
        true
    }

    /// Restore the initial labels.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The local track of `kind`, if the session is connected and has exactly one.
fn single_local_track(session: Option<&Session>, kind: TrackKind) -> Option<MediaTrack> {
    let session = session.filter(|s| s.is_connected())?;
    let publications = session.local_participant().publications_of_kind(kind);

    match publications.as_slice() {
        [] => {
            debug!(target: "room.controls", kind = %kind, "No local track, toggle ignored");
            None
        }
        [publication] => publication.track(),
        many => {
            warn!(
                target: "room.controls",
                kind = %kind,
                count = many.len(),
                "More than one local track, toggle ignored"
            );
            None
        }
    }
}
