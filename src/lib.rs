//! # resplite
//!
//! A minimal, synchronous client for the Redis RESP wire protocol:
//! - Encodes any command as a name plus ordered byte-string arguments
//! - Decodes status, error, integer, bulk and multi-bulk replies,
//!   keeping null bulks and null arrays distinct from empty ones
//! - One blocking request/reply round trip at a time on one owned stream
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Caller                               │
//! │              execute(name, args) -> Reply                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Connection                                │
//! │        (owns one Transport, Open -> Closed)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   encode    │          │ read_reply  │
//!   │  (*N $len)  │          │ (+ - : $ *) │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use resplite::{Connection, Reply};
//!
//! # fn main() -> resplite::Result<()> {
//! let mut conn = Connection::open("127.0.0.1", 6379, Some(0))?;
//! conn.execute("SET", ["greeting", "hello"])?;
//! match conn.execute("GET", ["greeting"])? {
//!     Reply::Bulk(Some(value)) => println!("{}", String::from_utf8_lossy(&value)),
//!     Reply::Bulk(None) => println!("missing"),
//!     other => println!("unexpected: {other:?}"),
//! }
//! conn.close();
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ClientError, Result};
pub use config::ConnectionConfig;
pub use network::{Connection, ConnectionState, Transport};
pub use protocol::{Command, Reply, ServerError, ToArg};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of resplite
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
