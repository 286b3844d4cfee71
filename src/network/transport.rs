//! Transport abstraction
//!
//! The byte stream a [`Connection`](super::Connection) talks over.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// A bidirectional byte stream that can be released explicitly
pub trait Transport: Read + Write {
    /// Release the underlying resource.
    ///
    /// Called once by [`Connection::close`](super::Connection::close); the
    /// transport is dropped right after.
    fn shutdown(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Transport for TcpStream {
    fn shutdown(&mut self) -> io::Result<()> {
        match TcpStream::shutdown(self, Shutdown::Both) {
            // Peer already went away
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn shutdown(&mut self) -> io::Result<()> {
        (**self).shutdown()
    }
}
