//! Participant views.
//!
//! - [`surface`] - the presentation seam and an in-memory document
//! - [`manager`] - keeps one container per participant in sync with its tracks

pub mod manager;
pub mod surface;

pub use manager::{ListenerEvent, ListenerKey, ParticipantViewManager};
pub use surface::{HeadlessDocument, ViewSurface};
