//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate and defines
//! [`AccessToken`], the room access credential issued by the join-room
//! endpoint.
//!
//! # Compile-Time Safety
//!
//! `SecretString` implements `Debug` with redaction, so any struct deriving
//! `Debug` that holds a secret gets safe logging behavior. A token can only be
//! read through an explicit `expose_secret()` call.
//!
//! # Example
//!
//! ```rust
//! use common::secret::AccessToken;
//!
//! let token = AccessToken::from("eyJhbGciOi.payload.sig");
//!
//! // Debug output never contains the token value
//! assert!(!format!("{token:?}").contains("payload"));
//!
//! // Reading it is an explicit act
//! assert_eq!(token.expose(), "eyJhbGciOi.payload.sig");
//! ```
//!
//! # Serde Integration
//!
//! `AccessToken` deserializes from a plain JSON string, so response types can
//! hold it directly:
//!
//! ```rust
//! use serde::Deserialize;
//! use common::secret::AccessToken;
//!
//! #[derive(Debug, Deserialize)]
//! struct JoinRoomResponse {
//!     token: AccessToken,
//! }
//!
//! let json = r#"{"token": "abc"}"#;
//! let response: JoinRoomResponse = serde_json::from_str(json).unwrap();
//! assert_eq!(response.token.expose(), "abc");
//! ```

use serde::Deserialize;
use std::fmt;

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretString};

/// Short-lived credential authorizing one participant to join one room.
///
/// Opaque to the client: it is fetched from the token endpoint and handed to
/// the media service unchanged.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(SecretString);

impl AccessToken {
    /// Expose the raw token value.
    ///
    /// Only call this at the point where the token leaves the process.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Whether the token is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(SecretString::from(value))
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(SecretString::from(value))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let token = AccessToken::from("hunter2");
        let debug_str = format!("{token:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_expose_returns_inner_value() {
        let token = AccessToken::from("token-123".to_string());
        assert_eq!(token.expose(), "token-123");
        assert!(!token.is_empty());
        assert!(AccessToken::from("").is_empty());
    }

    #[test]
    fn test_struct_with_token_is_safe() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct JoinAttempt {
            room: String,
            token: AccessToken,
        }

        let attempt = JoinAttempt {
            room: "demo".to_string(),
            token: AccessToken::from("super-secret"),
        };

        let debug_str = format!("{attempt:?}");

        // Room should be visible
        assert!(debug_str.contains("demo"));
        // Token should be redacted
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super-secret"));
    }

    #[test]
    fn test_deserialize() {
        #[derive(Debug, Deserialize)]
        struct Response {
            token: AccessToken,
        }

        let json = r#"{"token": "my-secret-value"}"#;
        let response: Response = serde_json::from_str(json).expect("deserialize");

        assert_eq!(response.token.expose(), "my-secret-value");

        let debug = format!("{response:?}");
        assert!(!debug.contains("my-secret-value"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_clone_works() {
        let token = AccessToken::from("cloneable");
        let cloned = token.clone();
        assert_eq!(cloned.expose(), "cloneable");
    }
}
