use async_trait::async_trait;
use sshjail::{
    CommandResult, JailConnection, JailError, Transport, TransportConfig, TransportError,
    TransportFactory,
};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

type RecordedCall = (String, Option<Vec<u8>>);

/// Transport stand-in that records each command and its stdin payload.
#[derive(Clone, Default)]
struct RecordingTransport {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    exit_status: Arc<Mutex<u32>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn exec(
        &self,
        command: &str,
        _sudo: bool,
        input: Option<&[u8]>,
    ) -> Result<CommandResult, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((command.to_string(), input.map(|bytes| bytes.to_vec())));
        Ok(CommandResult {
            exit_status: *self.exit_status.lock().unwrap(),
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }

    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingFactory {
    transport: RecordingTransport,
}

#[async_trait]
impl TransportFactory for RecordingFactory {
    type Transport = RecordingTransport;

    async fn connect(
        &self,
        _host: &str,
        _config: &TransportConfig,
    ) -> Result<Self::Transport, TransportError> {
        Ok(self.transport.clone())
    }
}

fn connection() -> (JailConnection<RecordingFactory>, RecordingTransport) {
    let factory = RecordingFactory::default();
    let transport = factory.transport.clone();
    let conn = JailConnection::new(
        "myjail@server.example",
        TransportConfig::default(),
        factory,
    );
    (conn, transport)
}

#[tokio::test]
async fn test_put_bytes_pipes_payload_into_file() {
    let (mut conn, transport) = connection();

    conn.put_bytes(b"payload bytes", "/tmp/target.txt")
        .await
        .unwrap();

    let calls = transport.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "cat - > /tmp/target.txt");
    assert_eq!(calls[0].1.as_deref(), Some(b"payload bytes".as_slice()));
}

#[tokio::test]
async fn test_put_bytes_empty_payload_truncates_file() {
    let (mut conn, transport) = connection();

    conn.put_bytes(b"", "/tmp/empty.txt").await.unwrap();

    let calls = transport.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "cat /dev/null > /tmp/empty.txt");
    assert_eq!(calls[0].1.as_deref(), Some(b"".as_slice()));
}

#[tokio::test]
async fn test_put_bytes_quotes_hostile_remote_path() {
    let (mut conn, transport) = connection();

    conn.put_bytes(b"x", "/tmp/with space; rm -rf /")
        .await
        .unwrap();

    let calls = transport.calls.lock().unwrap().clone();
    assert_eq!(calls[0].0, "cat - > '/tmp/with space; rm -rf /'");
}

#[tokio::test]
async fn test_put_bytes_tolerates_remote_failure() {
    let (mut conn, transport) = connection();
    *transport.exit_status.lock().unwrap() = 1;

    // Remote exit status is logged, not escalated.
    conn.put_bytes(b"x", "/readonly/target").await.unwrap();
}

#[tokio::test]
async fn test_put_file_forwards_local_contents() {
    let (mut conn, transport) = connection();

    let mut local = NamedTempFile::new().unwrap();
    local.write_all(b"config = value\n").unwrap();
    local.flush().unwrap();

    conn.put_file(local.path(), "/etc/app.conf").await.unwrap();

    let calls = transport.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "cat - > /etc/app.conf");
    assert_eq!(calls[0].1.as_deref(), Some(b"config = value\n".as_slice()));
}

#[tokio::test]
async fn test_put_file_missing_local_file_is_io_error() {
    let (mut conn, transport) = connection();

    let err = conn
        .put_file(
            std::path::Path::new("/this/file/does/not/exist.txt"),
            "/tmp/destination.txt",
        )
        .await
        .unwrap_err();

    match err {
        JailError::Io { path, .. } => {
            assert_eq!(path.to_str(), Some("/this/file/does/not/exist.txt"));
        }
        other => panic!("expected Io, got {other:?}"),
    }
    assert!(transport.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_exec_command_runs_unescalated_with_input() {
    let (mut conn, transport) = connection();

    conn.exec_command("wc -c", Some(b"abc")).await.unwrap();

    let calls = transport.calls.lock().unwrap().clone();
    assert_eq!(calls[0].0, "wc -c");
    assert_eq!(calls[0].1.as_deref(), Some(b"abc".as_slice()));
}
