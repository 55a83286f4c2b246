//! Client error taxonomy

use crate::domain::entities::Action;
use thiserror::Error;

/// Errors surfaced by every client call.
///
/// Nothing here is retried: each variant reaches the caller exactly as the
/// request produced it.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A document-scoped read, update or delete hit a missing id
    #[error("Document not found ({action} {url})")]
    NotFound { action: Action, url: String },

    /// Any other non-success status
    #[error("HTTP error: return code is {status} ({url})")]
    Http { status: u16, url: String },

    /// Connection or read failure in the networking layer
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete within the caller's timeout
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A response body or stream chunk could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A request body could not be read
    #[error("Body error: {0}")]
    Body(String),

    /// Invalid client configuration or request arguments
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Status code carried by the error, if it came from an HTTP response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::NotFound { .. } => Some(404),
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
