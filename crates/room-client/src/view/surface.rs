//! View surface: where participant containers and media elements live.
//!
//! [`ViewSurface`] is the seam to the real presentation layer. Containers are
//! identified by participant identity. [`HeadlessDocument`] is an in-memory
//! surface for headless clients and tests.

use crate::errors::ViewError;
use crate::media::MediaElement;

use common::types::{ParticipantIdentity, TrackKind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Presentation layer operations used by the participant view manager.
pub trait ViewSurface: Send {
    /// Create an empty container for a participant.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::ContainerExists` if the id is taken.
    fn create_container(&mut self, id: &ParticipantIdentity) -> Result<(), ViewError>;

    /// Append a rendered media element to a container.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::ContainerNotFound` if the container is gone.
    fn append_element(
        &mut self,
        id: &ParticipantIdentity,
        element: MediaElement,
    ) -> Result<(), ViewError>;

    /// Remove a container and everything in it.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::ContainerNotFound` if there is no such container.
    fn remove_container(&mut self, id: &ParticipantIdentity) -> Result<(), ViewError>;
}

#[derive(Debug, Default)]
struct DocumentState {
    containers: Vec<(ParticipantIdentity, Vec<MediaElement>)>,
    mutations: u64,
}

/// In-memory document.
///
/// Clones share the same state, so a test can keep one clone for inspection
/// while the client owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessDocument {
    state: Arc<Mutex<DocumentState>>,
}

impl HeadlessDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DocumentState> {
        // State stays consistent across a panicking holder: every mutation is a
        // single push/remove.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Container ids in document order.
    #[must_use]
    pub fn container_ids(&self) -> Vec<ParticipantIdentity> {
        self.lock()
            .containers
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Whether a container exists.
    #[must_use]
    pub fn contains(&self, id: &ParticipantIdentity) -> bool {
        self.lock().containers.iter().any(|(cid, _)| cid == id)
    }

    /// Elements of a container, or `None` if it does not exist.
    #[must_use]
    pub fn elements(&self, id: &ParticipantIdentity) -> Option<Vec<MediaElement>> {
        self.lock()
            .containers
            .iter()
            .find(|(cid, _)| cid == id)
            .map(|(_, elements)| elements.clone())
    }

    /// Number of elements of one kind in a container (0 if absent).
    #[must_use]
    pub fn count_elements(&self, id: &ParticipantIdentity, kind: TrackKind) -> usize {
        self.elements(id)
            .map_or(0, |els| els.iter().filter(|e| e.kind == kind).count())
    }

    /// Total successful mutations since creation.
    #[must_use]
    pub fn mutation_count(&self) -> u64 {
        self.lock().mutations
    }
}

impl ViewSurface for HeadlessDocument {
    fn create_container(&mut self, id: &ParticipantIdentity) -> Result<(), ViewError> {
        let mut state = self.lock();
        if state.containers.iter().any(|(cid, _)| cid == id) {
            return Err(ViewError::ContainerExists(id.clone()));
        }
        state.containers.push((id.clone(), Vec::new()));
        state.mutations += 1;
        Ok(())
    }

    fn append_element(
        &mut self,
        id: &ParticipantIdentity,
        element: MediaElement,
    ) -> Result<(), ViewError> {
        let mut state = self.lock();
        let (_, elements) = state
            .containers
            .iter_mut()
            .find(|(cid, _)| cid == id)
            .ok_or_else(|| ViewError::ContainerNotFound(id.clone()))?;
        elements.push(element);
        state.mutations += 1;
        Ok(())
    }

    fn remove_container(&mut self, id: &ParticipantIdentity) -> Result<(), ViewError> {
        let mut state = self.lock();
        let before = state.containers.len();
        state.containers.retain(|(cid, _)| cid != id);
        if state.containers.len() == before {
            return Err(ViewError::ContainerNotFound(id.clone()));
        }
        state.mutations += 1;
        Ok(())
    }
}
