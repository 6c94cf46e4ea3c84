//! Common utilities and types shared across the room client crates.

#![warn(clippy::pedantic)]

/// Module for common data types (room names, identities, track kinds)
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;
