//! Protocol codec
//!
//! Encoding of commands and stream decoding of replies.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! *<N>\r\n
//! $<len(elem_0)>\r\n<elem_0>\r\n
//! ...
//! $<len(elem_N-1)>\r\n<elem_N-1>\r\n
//! ```
//! `elem_0` is the upper-cased command name; lengths are byte lengths.
//!
//! ### Reply Format
//! One CRLF-terminated header line whose first byte selects the kind:
//! ```text
//! +<status>\r\n
//! -<message>\r\n
//! :<i64>\r\n
//! $<len>\r\n<len bytes>\r\n      ($-1\r\n is null)
//! *<count>\r\n<count bulks>       (*-1\r\n is null)
//! ```
//!
//! Running out of bytes mid-reply is a transport failure (`UnexpectedEof`);
//! bytes that arrive but do not fit the grammar are a malformed reply.

use std::io::{self, BufRead, Read, Write};

use bytes::Bytes;

use super::{Command, Reply, ToArg};
use crate::error::{ClientError, Result};

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Bulk payloads are read in pieces of at most this many bytes
pub const BULK_CHUNK_SIZE: usize = 1024;

/// Largest accepted bulk length (512 MB)
pub const MAX_BULK_SIZE: i64 = 512 * 1024 * 1024;

/// Largest accepted array element count
pub const MAX_ARRAY_LEN: i64 = i32::MAX as i64;

/// Longest accepted header line, terminator excluded (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a command name and its arguments
pub fn encode<N, I>(name: N, args: I) -> Vec<u8>
where
    N: ToArg,
    I: IntoIterator,
    I::Item: ToArg,
{
    encode_command(&Command::new(name).args(args))
}

/// Encode a command to bytes
pub fn encode_command(command: &Command) -> Vec<u8> {
    let name = command.name().to_ascii_uppercase();

    let payload_len: usize = command.arguments().iter().map(|a| a.len()).sum();
    let mut message = Vec::with_capacity(16 * command.len() + name.len() + payload_len);

    push_header(&mut message, b'*', command.len());
    push_bulk(&mut message, &name);
    for arg in command.arguments() {
        push_bulk(&mut message, arg);
    }

    message
}

fn push_header(buf: &mut Vec<u8>, marker: u8, n: usize) {
    buf.push(marker);
    buf.extend_from_slice(n.to_string().as_bytes());
    buf.extend_from_slice(CRLF);
}

fn push_bulk(buf: &mut Vec<u8>, data: &[u8]) {
    push_header(buf, b'$', data.len());
    buf.extend_from_slice(data);
    buf.extend_from_slice(CRLF);
}

// =============================================================================
// Reply Decoding
// =============================================================================

/// Decode one reply from the front of a byte slice
///
/// Trailing bytes after the first complete reply are ignored.
pub fn decode_reply(bytes: &[u8]) -> Result<Reply> {
    let mut reader = bytes;
    read_reply(&mut reader)
}

/// Read exactly one complete reply from a stream
///
/// Blocks until the whole reply has arrived or an error occurs.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let line = read_line(reader)?;

    let Some((&marker, rest)) = line.split_first() else {
        return Err(ClientError::malformed(&line));
    };

    match marker {
        b'+' => Ok(Reply::Status(String::from_utf8_lossy(rest).into_owned())),
        b'-' => Ok(Reply::ProtocolError(String::from_utf8_lossy(rest).into_owned())),
        b':' => parse_integer(rest)
            .map(Reply::Integer)
            .ok_or_else(|| ClientError::malformed(&line)),
        b'$' => read_bulk_body(reader, &line).map(Reply::Bulk),
        b'*' => read_array_body(reader, &line),
        _ => Err(ClientError::malformed(&line)),
    }
}

/// Read one header line and strip its CRLF
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let limit = (MAX_LINE_LENGTH + CRLF.len()) as u64;
    let mut line = Vec::new();
    reader.by_ref().take(limit).read_until(b'\n', &mut line)?;

    if !line.ends_with(b"\n") {
        if line.len() as u64 >= limit {
            return Err(ClientError::MalformedReply(format!(
                "reply line exceeds {} bytes",
                MAX_LINE_LENGTH
            )));
        }
        return Err(unexpected_eof("connection closed before end of reply line"));
    }
    if !line.ends_with(CRLF) {
        return Err(ClientError::malformed(&line));
    }

    line.truncate(line.len() - CRLF.len());
    Ok(line)
}

/// Body of a `$` reply whose header line is `line`
fn read_bulk_body<R: BufRead>(reader: &mut R, line: &[u8]) -> Result<Option<Bytes>> {
    let len = match parse_integer(&line[1..]) {
        Some(-1) => return Ok(None),
        Some(len) if (0..=MAX_BULK_SIZE).contains(&len) => len as usize,
        _ => return Err(ClientError::malformed(line)),
    };

    let mut payload = Vec::with_capacity(len.min(64 * BULK_CHUNK_SIZE));
    let mut chunk = [0u8; BULK_CHUNK_SIZE];
    let mut remaining = len;
    while remaining > 0 {
        let n = remaining.min(BULK_CHUNK_SIZE);
        reader.read_exact(&mut chunk[..n])?;
        payload.extend_from_slice(&chunk[..n]);
        remaining -= n;
    }

    let mut terminator = [0u8; 2];
    reader.read_exact(&mut terminator)?;
    if terminator != CRLF {
        return Err(ClientError::MalformedReply(format!(
            "bulk of {} bytes not followed by CRLF (got {:?})",
            len,
            String::from_utf8_lossy(&terminator)
        )));
    }

    Ok(Some(Bytes::from(payload)))
}

/// Body of a `*` reply whose header line is `line`
///
/// Elements must be bulk-or-null; nested arrays, statuses and integers
/// inside an array are rejected as malformed.
fn read_array_body<R: BufRead>(reader: &mut R, line: &[u8]) -> Result<Reply> {
    let count = match parse_integer(&line[1..]) {
        Some(-1) => return Ok(Reply::Array(None)),
        Some(count) if (0..=MAX_ARRAY_LEN).contains(&count) => count as usize,
        _ => return Err(ClientError::malformed(line)),
    };

    let mut items = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let element = read_line(reader)?;
        if element.first() != Some(&b'$') {
            return Err(ClientError::malformed(&element));
        }
        items.push(Reply::Bulk(read_bulk_body(reader, &element)?));
    }

    Ok(Reply::Array(Some(items)))
}

/// Optional `-` then ASCII digits; `i64::from_str` alone would also take `+`
fn parse_integer(digits: &[u8]) -> Option<i64> {
    if digits.first() == Some(&b'+') {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

fn unexpected_eof(msg: &str) -> ClientError {
    ClientError::Transport(io::Error::new(io::ErrorKind::UnexpectedEof, msg.to_string()))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a command to a stream
///
/// Loops on partial writes; a write that makes no progress is a
/// transport failure.
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    write_fully(writer, &bytes)?;
    writer.flush()?;
    Ok(())
}

fn write_fully<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<()> {
    let mut written = 0;
    while written < bytes.len() {
        match writer.write(&bytes[written..]) {
            Ok(0) => {
                return Err(ClientError::Transport(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("write stalled after {} of {} bytes", written, bytes.len()),
                )))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
