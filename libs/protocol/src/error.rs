//! Codec errors.

use thiserror::Error;
use types::errors::RequestError;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("frame truncated: needed {needed} more bytes")]
    UnexpectedEof { needed: usize },

    #[error("unknown message type {0}")]
    UnknownType(String),

    #[error("invalid side byte {0}")]
    BadSide(u8),

    #[error("invalid UTF-8 in text field")]
    BadUtf8,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

impl From<ProtocolError> for RequestError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownType(t) => RequestError::UnknownMessageType(t),
            other => RequestError::Decode(other.to_string()),
        }
    }
}
