//! Reply definitions
//!
//! Represents one decoded server reply.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;

/// One decoded reply
///
/// `Bulk(None)` and `Array(None)` are the protocol's null values and are
/// distinct from an empty bulk string or an empty array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+` inline acknowledgement, e.g. `OK`
    Status(String),

    /// `:` signed 64-bit integer
    Integer(i64),

    /// `$` binary string, or null
    Bulk(Option<Bytes>),

    /// `*` sequence of bulk-or-null elements, or null
    Array(Option<Vec<Reply>>),

    /// `-` error reported by the server
    ProtocolError(String),
}

/// A server error reply lifted out of [`Reply::into_result`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Server error: {0}")]
pub struct ServerError(pub String);

impl Reply {
    /// True for a null bulk or null array
    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Bulk(None) | Reply::Array(None))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::ProtocolError(_))
    }

    pub fn as_status(&self) -> Option<&str> {
        match self {
            Reply::Status(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Reply::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Payload of a non-null bulk
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk(Some(b)) => Some(b),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        match self {
            Reply::Bulk(b) => b,
            _ => None,
        }
    }

    /// Elements of a non-null array
    pub fn into_array(self) -> Option<Vec<Reply>> {
        match self {
            Reply::Array(items) => items,
            _ => None,
        }
    }

    /// Split a server error reply off into `Err`, so callers can use `?`
    pub fn into_result(self) -> Result<Reply, ServerError> {
        match self {
            Reply::ProtocolError(message) => Err(ServerError(message)),
            other => Ok(other),
        }
    }
}

/// redis-cli style rendering
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Status(s) => write!(f, "{s}"),
            Reply::Integer(n) => write!(f, "(integer) {n}"),
            Reply::Bulk(None) | Reply::Array(None) => write!(f, "(nil)"),
            Reply::Bulk(Some(b)) => write!(f, "{:?}", String::from_utf8_lossy(b)),
            Reply::Array(Some(items)) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(Some(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {item}", i + 1)?;
                }
                Ok(())
            }
            Reply::ProtocolError(message) => write!(f, "(error) {message}"),
        }
    }
}
