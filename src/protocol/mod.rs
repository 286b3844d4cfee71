//! Protocol Module
//!
//! Pure encoding and decoding for the RESP wire protocol. No sockets, no
//! state: the [`network`](crate::network) module drives these functions over
//! a live stream.
//!
//! ### Reply Kinds
//! - `+`: status
//! - `-`: server error
//! - `:`: integer
//! - `$`: bulk string (`-1` length is null)
//! - `*`: array of bulk strings (`-1` count is null)

mod command;
mod reply;
mod codec;

pub use command::{Command, ToArg};
pub use reply::{Reply, ServerError};
pub use codec::{
    encode, encode_command, decode_reply, read_reply, write_command,
    BULK_CHUNK_SIZE, CRLF, MAX_ARRAY_LEN, MAX_BULK_SIZE, MAX_LINE_LENGTH,
};
