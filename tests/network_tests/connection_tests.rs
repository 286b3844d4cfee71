//! Tests for Connection
//!
//! These tests verify:
//! - Request/reply round trips against a stub TCP server
//! - Database selection during open, including server rejection
//! - Full delivery of a request over a transport that accepts few bytes per write
//! - Error taxonomy: connect, transport, malformed, not connected
//! - Close semantics (idempotent, release on drop)

use std::net::TcpListener;

use bytes::Bytes;
use resplite::protocol::encode;
use resplite::{ClientError, Connection, ConnectionConfig, ConnectionState, Reply};

use crate::common::{ScriptedTransport, StubServer};

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_set_then_get_missing() {
    let server = StubServer::start(vec!["+OK\r\n", "$-1\r\n"]);
    let mut conn = Connection::open("127.0.0.1", server.port, None).unwrap();

    let set = conn.execute("SET", ["k", "v"]).unwrap();
    assert_eq!(set, Reply::Status("OK".to_string()));

    let get = conn.execute("GET", ["missing"]).unwrap();
    assert_eq!(get, Reply::Bulk(None));

    conn.close();

    let requests = server.requests();
    assert_eq!(requests[0], b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n");
    assert_eq!(requests[1], b"*2\r\n$3\r\nGET\r\n$7\r\nmissing\r\n");
}

#[test]
fn test_error_reply_is_a_value() {
    let server = StubServer::start(vec!["-ERR missing key\r\n", ":1\r\n"]);
    let mut conn = Connection::open("127.0.0.1", server.port, None).unwrap();

    let reply = conn.execute("INCR", ["not-a-number"]).unwrap();
    assert_eq!(reply, Reply::ProtocolError("ERR missing key".to_string()));

    // The connection is still usable afterwards
    assert!(conn.is_open());
    assert_eq!(conn.execute("DEL", ["k"]).unwrap(), Reply::Integer(1));
}

#[test]
fn test_multi_bulk_reply() {
    let server = StubServer::start(vec!["*3\r\n$1\r\na\r\n$-1\r\n$0\r\n\r\n"]);
    let mut conn = Connection::open("127.0.0.1", server.port, None).unwrap();

    let reply = conn.execute("MGET", ["a", "b", "c"]).unwrap();
    assert_eq!(
        reply,
        Reply::Array(Some(vec![
            Reply::Bulk(Some(Bytes::from_static(b"a"))),
            Reply::Bulk(None),
            Reply::Bulk(Some(Bytes::new())),
        ]))
    );
}

#[test]
fn test_ping() {
    let server = StubServer::start(vec!["+PONG\r\n"]);
    let mut conn = Connection::open("127.0.0.1", server.port, None).unwrap();

    assert_eq!(conn.ping().unwrap(), Reply::Status("PONG".to_string()));
    drop(conn);
    assert_eq!(server.requests(), vec![b"*1\r\n$4\r\nPING\r\n".to_vec()]);
}

// =============================================================================
// Open / Select Tests
// =============================================================================

#[test]
fn test_open_selects_database() {
    let server = StubServer::start(vec!["+OK\r\n", ":0\r\n"]);
    let mut conn = Connection::open("127.0.0.1", server.port, Some(3)).unwrap();

    assert_eq!(conn.execute("DBSIZE", std::iter::empty::<&str>()).unwrap(), Reply::Integer(0));
    conn.close();

    let requests = server.requests();
    assert_eq!(requests[0], b"*2\r\n$6\r\nSELECT\r\n$1\r\n3\r\n");
}

#[test]
fn test_open_fails_when_select_rejected() {
    let server = StubServer::start(vec!["-ERR DB index is out of range\r\n"]);
    let result = Connection::open("127.0.0.1", server.port, Some(99));

    match result {
        Err(ClientError::SelectRejected { index, message, .. }) => {
            assert_eq!(index, 99);
            assert_eq!(message, "ERR DB index is out of range");
        }
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("open should fail"),
    }

    assert_eq!(server.requests().len(), 1);
}

#[test]
fn test_select_rejection_is_connect_failure() {
    let server = StubServer::start(vec!["-ERR invalid DB index\r\n"]);
    assert!(result_is_connect_failure(Connection::open(
        "127.0.0.1",
        server.port,
        Some(-1)
    )));
}

#[test]
fn test_open_fails_when_server_hangs_up_during_select() {
    // Empty reply: the server reads SELECT, then closes without answering
    let server = StubServer::start(vec![""]);
    let err = Connection::open("127.0.0.1", server.port, Some(1)).err().unwrap();

    assert!(matches!(err, ClientError::Connect { .. }), "got {err:?}");
    assert!(err.is_connect_failure());
    assert_eq!(
        server.requests(),
        vec![b"*2\r\n$6\r\nSELECT\r\n$1\r\n1\r\n".to_vec()]
    );
}

#[test]
fn test_open_fails_when_select_reply_malformed() {
    let server = StubServer::start(vec!["!garbage\r\n"]);
    let err = Connection::open("127.0.0.1", server.port, Some(1)).err().unwrap();

    match &err {
        ClientError::Connect { source, .. } => {
            assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
            assert!(source.to_string().contains("!garbage"));
        }
        other => panic!("expected connect failure, got {other:?}"),
    }
    assert!(err.is_connect_failure());
    assert_eq!(server.requests().len(), 1);
}

#[test]
fn test_connect_refused() {
    let err = Connection::open("127.0.0.1", unused_port(), None).err().unwrap();
    assert!(matches!(err, ClientError::Connect { .. }));
    assert!(err.is_connect_failure());
}

#[test]
fn test_connect_with_config_and_timeouts() {
    let server = StubServer::start(vec!["+OK\r\n"]);
    let config = ConnectionConfig::builder()
        .port(server.port)
        .connect_timeout_ms(1000)
        .read_timeout_ms(1000)
        .write_timeout_ms(1000)
        .build();

    let mut conn = Connection::connect(&config).unwrap();
    assert_eq!(conn.addr(), format!("127.0.0.1:{}", server.port));
    assert_eq!(conn.execute("SET", ["a", "b"]).unwrap(), Reply::Status("OK".into()));
}

// =============================================================================
// Transport Behaviour Tests
// =============================================================================

#[test]
fn test_partial_writes_deliver_whole_command() {
    let (transport, log) = ScriptedTransport::new(b"+OK\r\n", 3);
    let mut conn = Connection::from_transport(transport, "scripted");

    let value = "x".repeat(100);
    let reply = conn.execute("SET", ["key", value.as_str()]).unwrap();
    assert_eq!(reply, Reply::Status("OK".to_string()));

    let expected = encode("SET", ["key", value.as_str()]);
    let log = log.lock().unwrap();
    assert_eq!(log.written, expected);
    assert!(log.write_calls >= expected.len() / 3);
}

#[test]
fn test_zero_progress_write_is_transport_failure() {
    let (transport, log) = ScriptedTransport::new(b"+OK\r\n", 0);
    let mut conn = Connection::from_transport(transport, "scripted");

    let err = conn.execute("SET", ["k", "v"]).unwrap_err();
    match err {
        ClientError::Transport(e) => assert_eq!(e.kind(), std::io::ErrorKind::WriteZero),
        other => panic!("expected transport failure, got {other:?}"),
    }
    assert_eq!(log.lock().unwrap().write_calls, 1);
}

#[test]
fn test_truncated_reply_is_transport_failure() {
    let (transport, _log) = ScriptedTransport::new(b"$5\r\nhel", usize::MAX);
    let mut conn = Connection::from_transport(transport, "scripted");

    let err = conn.execute("GET", ["k"]).unwrap_err();
    assert!(err.is_transport_failure(), "got {err:?}");
}

#[test]
fn test_malformed_reply() {
    let (transport, _log) = ScriptedTransport::new(b"!bogus\r\n", usize::MAX);
    let mut conn = Connection::from_transport(transport, "scripted");

    let err = conn.execute("GET", ["k"]).unwrap_err();
    assert!(matches!(err, ClientError::MalformedReply(ref line) if line == "!bogus"));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_execute_after_close_is_not_connected() {
    let (transport, log) = ScriptedTransport::new(b"", usize::MAX);
    let mut conn = Connection::from_transport(transport, "scripted");
    assert_eq!(conn.state(), ConnectionState::Open);

    conn.close();
    assert_eq!(conn.state(), ConnectionState::Closed);

    let err = conn.execute("GET", ["k"]).unwrap_err();
    assert!(matches!(err, ClientError::NotConnected));
    assert!(log.lock().unwrap().written.is_empty());
}

#[test]
fn test_close_is_idempotent() {
    let (transport, log) = ScriptedTransport::new(b"", usize::MAX);
    let mut conn = Connection::from_transport(transport, "scripted");

    conn.close();
    conn.close();
    drop(conn);

    assert_eq!(log.lock().unwrap().shutdowns, 1);
}

#[test]
fn test_drop_releases_transport() {
    let (transport, log) = ScriptedTransport::new(b"", usize::MAX);
    {
        let _conn = Connection::from_transport(transport, "scripted");
    }
    assert_eq!(log.lock().unwrap().shutdowns, 1);
}

// =============================================================================
// Helper Functions
// =============================================================================

fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

fn result_is_connect_failure<T>(result: resplite::Result<T>) -> bool {
    matches!(result, Err(ref e) if e.is_connect_failure())
}
