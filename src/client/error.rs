//! Client-side errors.

use thiserror::Error;

/// Errors surfaced by the subscription manager and its connectors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The gateway rejected the handshake credential.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The transport could not be opened or failed mid-flight.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway answered the handshake with something other than `connected`.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// An operation needed a live connection and there is none.
    #[error("Not connected")]
    NotConnected,

    /// The connection closed while a request was outstanding.
    #[error("Connection closed")]
    Disconnected,

    /// No acknowledgment arrived within the join timeout.
    #[error("Timed out joining project room '{project_id}'")]
    JoinTimeout { project_id: String },
}

impl ClientError {
    /// Returns true when retrying with the same token cannot succeed.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, ClientError::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_timeout_names_the_project() {
        let err = ClientError::JoinTimeout {
            project_id: "p1".to_string(),
        };
        assert_eq!(err.to_string(), "Timed out joining project room 'p1'");
    }

    #[test]
    fn only_unauthorized_requires_reauthentication() {
        assert!(ClientError::Unauthorized("bad".into()).requires_reauthentication());
        assert!(!ClientError::Disconnected.requires_reauthentication());
    }
}
