//! Configuration for resplite
//!
//! Connection settings with sensible defaults.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

/// Default server port
pub const DEFAULT_PORT: u16 = 6379;

/// Settings for opening a [`Connection`](crate::Connection)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    // -------------------------------------------------------------------------
    // Address
    // -------------------------------------------------------------------------
    /// Server host name or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    /// Logical database selected right after connecting, if any
    pub database: Option<i64>,

    // -------------------------------------------------------------------------
    // Transport Configuration
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds, 0 = OS default)
    pub connect_timeout_ms: u64,

    /// Read timeout (milliseconds, 0 = block indefinitely)
    pub read_timeout_ms: u64,

    /// Write timeout (milliseconds, 0 = block indefinitely)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm on the socket
    pub nodelay: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database: None,
            connect_timeout_ms: 0,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            nodelay: true,
        }
    }
}

impl ConnectionConfig {
    /// Create a new config builder
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// `host:port`, as used for socket resolution and logging
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }

    pub(crate) fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub(crate) fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Parses `host`, `host:port` or `host:port/db`, with an optional
/// `redis://` prefix. IPv6 literals take a port only in brackets
/// (`[::1]:6380`); a bare `::1` is all host.
impl FromStr for ConnectionConfig {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("redis://").unwrap_or(s);

        let (hostport, database) = match rest.split_once('/') {
            Some((hp, "")) => (hp, None),
            Some((hp, db)) => {
                let index = db
                    .parse::<i64>()
                    .map_err(|_| ClientError::Config(format!("invalid database index: {db:?}")))?;
                (hp, Some(index))
            }
            None => (rest, None),
        };

        let (host, port) = split_host_port(hostport)?;

        if host.is_empty() {
            return Err(ClientError::Config(format!("missing host in {s:?}")));
        }

        let mut builder = ConnectionConfig::builder().host(host).port(port);
        if let Some(index) = database {
            builder = builder.database(index);
        }
        Ok(builder.build())
    }
}

fn split_host_port(hostport: &str) -> Result<(&str, u16), ClientError> {
    let (host, port) = if let Some(bracketed) = hostport.strip_prefix('[') {
        let (host, after) = bracketed
            .split_once(']')
            .ok_or_else(|| ClientError::Config(format!("unclosed '[' in {hostport:?}")))?;
        match after {
            "" => (host, None),
            _ => match after.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None => {
                    return Err(ClientError::Config(format!(
                        "unexpected {after:?} after IPv6 address"
                    )))
                }
            },
        }
    } else if hostport.matches(':').count() > 1 {
        (hostport, None)
    } else {
        match hostport.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (hostport, None),
        }
    };

    let port = match port {
        Some(port) => port
            .parse::<u16>()
            .map_err(|_| ClientError::Config(format!("invalid port: {port:?}")))?,
        None => DEFAULT_PORT,
    };
    Ok((host, port))
}

/// Builder for ConnectionConfig
#[derive(Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Select this logical database after connecting
    pub fn database(mut self, index: i64) -> Self {
        self.config.database = Some(index);
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}
