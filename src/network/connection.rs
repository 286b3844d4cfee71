//! Client Connection
//!
//! Owns one open stream to a server and runs one command at a time on it.

use std::io::{self, BufReader};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::Transport;
use crate::config::ConnectionConfig;
use crate::error::{ClientError, Result};
use crate::protocol::{read_reply, write_command, Command, Reply, ToArg};

/// Lifecycle of a [`Connection`]
///
/// A connection only exists once its transport is open, so the unopened
/// state has no value of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

/// A single client connection
///
/// Each [`execute`](Connection::execute) writes one command and blocks until
/// exactly one reply has been read. A connection must not be shared between
/// threads without external serialization: interleaved commands would
/// corrupt the request stream and hand replies to the wrong caller.
///
/// After a transport failure or a malformed reply the stream position is
/// unknown; close the connection and open a new one.
pub struct Connection<T: Transport = TcpStream> {
    /// Buffered for reading; writes go straight to the inner transport
    stream: Option<BufReader<T>>,

    /// Peer address for logging
    addr: String,
}

impl Connection<TcpStream> {
    /// Open a TCP connection to `host:port`, selecting `database` if given
    pub fn open(host: &str, port: u16, database: Option<i64>) -> Result<Self> {
        let mut builder = ConnectionConfig::builder().host(host).port(port);
        if let Some(index) = database {
            builder = builder.database(index);
        }
        Self::connect(&builder.build())
    }

    /// Open a TCP connection described by `config`
    ///
    /// If a database is configured it is selected before returning. A failed
    /// selection fails the whole call and the socket is closed.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let addr = config.addr();

        let stream = open_stream(config).map_err(|source| ClientError::Connect {
            addr: addr.clone(),
            source,
        })?;

        tracing::debug!("Connected to {}", addr);

        let mut conn = Connection::from_transport(stream, addr);

        if let Some(index) = config.database {
            // On error `conn` is dropped here, which closes the socket
            conn.select(index).map_err(|e| match e {
                ClientError::Transport(source) => ClientError::Connect {
                    addr: config.addr(),
                    source,
                },
                ClientError::MalformedReply(line) => ClientError::Connect {
                    addr: config.addr(),
                    source: io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("malformed SELECT reply: {line:?}"),
                    ),
                },
                other => other,
            })?;
        }

        Ok(conn)
    }
}

impl<T: Transport> Connection<T> {
    /// Wrap an already-open transport
    ///
    /// `addr` is only used in log lines and error messages.
    pub fn from_transport(transport: T, addr: impl Into<String>) -> Self {
        Self {
            stream: Some(BufReader::new(transport)),
            addr: addr.into(),
        }
    }

    /// Send `name` with `args` and wait for the reply
    ///
    /// A server error reply comes back as `Ok(Reply::ProtocolError(..))`;
    /// only transport and stream failures are returned as `Err`.
    pub fn execute<N, I>(&mut self, name: N, args: I) -> Result<Reply>
    where
        N: ToArg,
        I: IntoIterator,
        I::Item: ToArg,
    {
        self.execute_command(&Command::new(name).args(args))
    }

    /// Send a prepared command and wait for the reply
    pub fn execute_command(&mut self, command: &Command) -> Result<Reply> {
        let stream = self.stream.as_mut().ok_or(ClientError::NotConnected)?;

        tracing::trace!(
            "Sending {} ({} args) to {}",
            String::from_utf8_lossy(command.name()),
            command.arguments().len(),
            self.addr
        );

        if let Err(e) = write_command(stream.get_mut(), command) {
            tracing::warn!("Error writing to {}: {}", self.addr, e);
            return Err(e);
        }

        match read_reply(stream) {
            Ok(reply) => {
                tracing::trace!("Received reply from {}: {:?}", self.addr, reply);
                Ok(reply)
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", self.addr, e);
                Err(e)
            }
        }
    }

    /// Switch to logical database `index`
    ///
    /// A server error reply is turned into [`ClientError::SelectRejected`].
    pub fn select(&mut self, index: i64) -> Result<()> {
        match self.execute("SELECT", [index])? {
            Reply::ProtocolError(message) => Err(ClientError::SelectRejected {
                addr: self.addr.clone(),
                index,
                message,
            }),
            _ => {
                tracing::debug!("Selected database {} on {}", index, self.addr);
                Ok(())
            }
        }
    }

    /// Health check
    pub fn ping(&mut self) -> Result<Reply> {
        self.execute("PING", std::iter::empty::<&str>())
    }

    /// Release the transport
    ///
    /// Closing an already-closed connection does nothing.
    pub fn close(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };

        let mut transport = stream.into_inner();
        match transport.shutdown() {
            Ok(()) => tracing::debug!("Closed connection to {}", self.addr),
            Err(e) => tracing::debug!("Error shutting down {}: {}", self.addr, e),
        }
    }

    pub fn state(&self) -> ConnectionState {
        if self.stream.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Get the peer address string
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl<T: Transport> Drop for Connection<T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Establish and configure the socket
fn open_stream(config: &ConnectionConfig) -> io::Result<TcpStream> {
    let stream = match config.connect_timeout() {
        Some(timeout) => connect_with_timeout(&config.host, config.port, timeout)?,
        None => TcpStream::connect((config.host.as_str(), config.port))?,
    };

    stream.set_nodelay(config.nodelay)?;
    stream.set_read_timeout(config.read_timeout())?;
    stream.set_write_timeout(config.write_timeout())?;

    Ok(stream)
}

/// Try every resolved address in turn, keeping the last error
fn connect_with_timeout(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{host}:{port} resolved to no addresses"),
        )
    }))
}
