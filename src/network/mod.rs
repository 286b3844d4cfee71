//! Network Module
//!
//! Client side of the wire protocol over a single blocking stream.
//!
//! ## Model
//! - One transport per [`Connection`], exclusively owned
//! - One request in flight: write the command, block until one reply is read
//! - No pooling, pipelining or reconnection; a caller that needs concurrency
//!   holds several independent connections

mod transport;
mod connection;

pub use transport::Transport;
pub use connection::{Connection, ConnectionState};
