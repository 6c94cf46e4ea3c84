//! Room client error types.
//!
//! Every error maps to a user-facing message shown by the join form.
//! Internal details are logged but not exposed to the user.

use common::types::{ParticipantIdentity, RoomNameError};
use thiserror::Error;

/// Room client error type.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// Token request could not be sent or the server was unreachable.
    #[error("Network error: {0}")]
    Network(String),

    /// Token response was malformed or not what the endpoint contract promises.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The media service refused or failed the room connection.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectError),

    /// User input rejected before anything was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the current UI state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The client actor is gone.
    #[error("Room client stopped")]
    Stopped,
}

impl ClientError {
    /// Returns a user-safe error message (no internal details).
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Network(_) => {
                "Could not reach the server, check your connection and try again".to_string()
            }
            ClientError::Protocol(_) => "The server sent an unexpected response".to_string(),
            ClientError::Connection(_) => "Could not connect to the room".to_string(),
            ClientError::InvalidInput(msg) | ClientError::InvalidState(msg) => msg.clone(),
            ClientError::Stopped => "The room client has stopped".to_string(),
        }
    }
}

impl From<RoomNameError> for ClientError {
    fn from(err: RoomNameError) -> Self {
        ClientError::InvalidInput(err.to_string())
    }
}

/// Failure reported by the media service while connecting.
///
/// The code and message are opaque values supplied by the service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct ConnectError {
    /// Service-specific error code.
    pub code: u32,
    /// Service-supplied description.
    pub message: String,
}

impl ConnectError {
    /// Create a new connect error.
    #[must_use]
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// View surface errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// A container with this id already exists.
    #[error("Container already exists: {0}")]
    ContainerExists(ParticipantIdentity),

    /// No container with this id exists.
    #[error("Container not found: {0}")]
    ContainerNotFound(ParticipantIdentity),
}
