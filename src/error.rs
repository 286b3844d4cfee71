//! Error types for resplite
//!
//! Provides a unified error type for connection and protocol operations.
//!
//! A server error reply (`-ERR ...`) is not an engine failure and never shows
//! up here: it is decoded as [`Reply::ProtocolError`](crate::Reply) and
//! returned as a value.

use thiserror::Error;

/// Result type alias using ClientError
pub type Result<T> = std::result::Result<T, ClientError>;

/// Unified error type for resplite operations
#[derive(Debug, Error)]
pub enum ClientError {
    // -------------------------------------------------------------------------
    // Connect Errors
    // -------------------------------------------------------------------------
    #[error("Unable to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server at {addr} rejected SELECT {index}: {message}")]
    SelectRejected {
        addr: String,
        index: i64,
        message: String,
    },

    // -------------------------------------------------------------------------
    // Established Connection Errors
    // -------------------------------------------------------------------------
    #[error("Transport failure: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Malformed reply: {0:?}")]
    MalformedReply(String),

    #[error("Connection is not open")]
    NotConnected,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// True for failures of `open`: the socket could not be established or
    /// the post-connect database selection failed.
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            ClientError::Connect { .. } | ClientError::SelectRejected { .. }
        )
    }

    /// True for read/write failures on an established connection.
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    pub(crate) fn malformed(line: &[u8]) -> Self {
        ClientError::MalformedReply(String::from_utf8_lossy(line).into_owned())
    }
}
