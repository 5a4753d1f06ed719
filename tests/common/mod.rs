//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

use lxd_provider::config::{BackoffConfig, LxdConfig};
use lxd_provider::lifecycle::Shutdown;
use lxd_provider::provider::LxdProvider;
use lxd_provider::Message;

#[derive(Default)]
struct FakeState {
    instances: Vec<Value>,
    fail_listing: bool,
    requests: Vec<String>,
}

/// In-process stand-in for the LXD daemon, answering raw HTTP/1.1 on a
/// unix socket inside a temporary directory.
pub struct FakeLxd {
    socket: PathBuf,
    state: Arc<Mutex<FakeState>>,
    _dir: TempDir,
}

#[allow(dead_code)]
impl FakeLxd {
    pub async fn start() -> Self {
        Self::start_in(tempfile::tempdir().unwrap())
    }

    /// Serve on [`socket_path`] inside `dir`.
    pub fn start_in(dir: TempDir) -> Self {
        let socket = socket_path(dir.path());
        let listener = UnixListener::bind(&socket).unwrap();
        let state = Arc::new(Mutex::new(FakeState::default()));

        let shared = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let shared = shared.clone();
                tokio::spawn(async move {
                    let _ = handle(stream, shared).await;
                });
            }
        });

        Self {
            socket,
            state,
            _dir: dir,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("unix://{}", self.socket.display())
    }

    pub fn set_instances(&self, instances: Vec<Value>) {
        self.state.lock().unwrap().instances = instances;
    }

    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().unwrap().fail_listing = fail;
    }

    /// Request lines received so far, e.g. `GET /1.0 HTTP/1.1`.
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }
}

pub fn socket_path(dir: &Path) -> PathBuf {
    dir.join("unix.socket")
}

async fn handle(mut stream: UnixStream, state: Arc<Mutex<FakeState>>) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&head).to_string();
    let request_line = head.lines().next().unwrap_or_default().to_string();
    let path = request_line.split_whitespace().nth(1).unwrap_or_default().to_string();

    let (status, body) = {
        let mut state = state.lock().unwrap();
        state.requests.push(request_line);
        match path.as_str() {
            "/1.0" => (200, sync(json!({
                "api_version": "1.0",
                "environment": { "server_name": "fake-lxd", "server_version": "5.21.1" }
            }))),
            "/1.0/instances?recursion=2" if state.fail_listing => (500, error(500, "database is locked")),
            "/1.0/instances?recursion=2" => (200, sync(Value::Array(state.instances.clone()))),
            _ => (404, error(404, "not found")),
        }
    };

    let body = body.to_string();
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn sync(metadata: Value) -> Value {
    json!({
        "type": "sync",
        "status": "Success",
        "status_code": 200,
        "metadata": metadata,
    })
}

fn error(code: u16, message: &str) -> Value {
    json!({
        "type": "error",
        "error": message,
        "error_code": code,
    })
}

/// LXD instance payload with one global IPv4 address on `eth0`.
#[allow(dead_code)]
pub fn instance(name: &str, status: &str, address: &str, config: Value) -> Value {
    json!({
        "name": name,
        "status": status,
        "config": {},
        "expanded_config": config,
        "state": {
            "network": {
                "lo": {
                    "addresses": [
                        { "family": "inet", "address": "127.0.0.1", "netmask": "8", "scope": "local" }
                    ],
                    "type": "loopback"
                },
                "eth0": {
                    "addresses": [
                        { "family": "inet", "address": address, "netmask": "24", "scope": "global" },
                        { "family": "inet6", "address": "fe80::1", "netmask": "64", "scope": "link" }
                    ],
                    "hwaddr": "00:16:3e:00:00:01",
                    "state": "up",
                    "type": "broadcast"
                }
            }
        }
    })
}

/// A running provider wired to a channel.
#[allow(dead_code)]
pub struct Harness {
    pub rx: mpsc::Receiver<Message>,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl Harness {
    pub fn start(endpoint: String) -> Self {
        let config = LxdConfig {
            endpoint,
            poll_interval_secs: 1,
            request_timeout_secs: 2,
            ..Default::default()
        };
        let backoff = BackoffConfig {
            initial_interval_ms: 20,
            multiplier: 2.0,
            max_interval_ms: 200,
        };
        let provider = LxdProvider::new(config, backoff).unwrap();
        let shutdown = Shutdown::new();
        let (tx, rx) = mpsc::channel(16);
        let handle = provider.provide(tx, shutdown.subscribe());
        Self { rx, shutdown, handle }
    }

    /// Next published message, failing the test after five seconds.
    pub async fn next(&mut self) -> Message {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("no snapshot within 5s")
            .expect("provider stopped")
    }

    pub async fn stop(mut self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("provider did not stop")
            .unwrap();
        while self.rx.try_recv().is_ok() {}
        assert!(self.rx.recv().await.is_none());
    }
}
