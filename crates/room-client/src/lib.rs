//! Room Client
//!
//! Joins a named video room and keeps one view container per participant in
//! sync with that participant's media tracks.
//!
//! # Architecture
//!
//! - [`token_client`] - fetches an access token from the join-room endpoint
//! - [`session`] - one connection to a room on the media service
//! - [`view`] - participant containers and their track listeners
//! - [`controls`] - local video/audio toggles
//! - [`app`] - the actor tying it together behind a cloneable handle
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let (client, task) = RoomClient::spawn(
//!     TokenClient::new(&config)?,
//!     connector,
//!     HeadlessDocument::new(),
//!     CancellationToken::new(),
//! );
//! client.join("demo").await?;
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod config;
pub mod controls;
pub mod errors;
pub mod media;
pub mod session;
pub mod token_client;
pub mod view;

pub use app::{RoomClient, RoomClientHandle, UiSnapshot, UiState};
pub use config::ClientConfig;
pub use errors::ClientError;
pub use token_client::TokenClient;
