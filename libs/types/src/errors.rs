//! Request-error taxonomy.
//!
//! Every variant except `ConnectionClosed` is recovered at the per-request
//! boundary and surfaced to the client as a structured error response; the
//! connection stays up. `ConnectionClosed` ends the per-connection task.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Malformed message: {0}")]
    Decode(String),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Symbol not found")]
    SymbolNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Insufficient position")]
    InsufficientPosition,

    #[error("Order pool exhausted")]
    PoolExhausted,

    #[error("Connection closed")]
    ConnectionClosed,
}

impl RequestError {
    /// Whether this error terminates the per-connection task.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RequestError::ConnectionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_visible_messages() {
        assert_eq!(RequestError::SessionNotFound.to_string(), "Session not found");
        assert_eq!(RequestError::UserNotFound.to_string(), "User not found");
        assert_eq!(
            RequestError::DuplicateUsername.to_string(),
            "Username already taken"
        );
        assert_eq!(
            RequestError::InsufficientFunds.to_string(),
            "Insufficient funds"
        );
    }

    #[test]
    fn test_only_connection_closed_is_fatal() {
        assert!(RequestError::ConnectionClosed.is_fatal());
        assert!(!RequestError::Decode("bad frame".into()).is_fatal());
        assert!(!RequestError::PoolExhausted.is_fatal());
    }
}
