//! LXD REST client over the local unix socket.
//!
//! # Responsibilities
//! - Parse the configured endpoint (unix sockets only)
//! - Create a client by probing `GET /1.0`
//! - List running instances with `GET /1.0/instances?recursion=2`
//!
//! # Design Decisions
//! - One HTTP/1.1 connection per request; listings are infrequent
//! - Every request has a deadline
//! - No retries here: failures surface to the supervisor

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use hyper::header;
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use tokio::net::UnixStream;
use url::Url;

use crate::provider::error::{ConnectionError, EnumerationError, TransportError};
use crate::provider::lxd::types::{ApiInstance, ApiResponse, ApiServer, InstanceRecord};

/// Largest response body accepted from LXD.
const MAX_RESPONSE_BYTES: usize = 64 * 1024 * 1024;

const INSTANCES_PATH: &str = "/1.0/instances?recursion=2";

/// A parsed LXD endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
}

impl Endpoint {
    /// Parse an endpoint URL. Only `unix://` is accepted.
    pub fn parse(raw: &str) -> Result<Self, ConnectionError> {
        let url = Url::parse(raw).map_err(|source| ConnectionError::InvalidEndpoint {
            endpoint: raw.to_string(),
            source,
        })?;

        match url.scheme() {
            "unix" if !url.path().is_empty() => Ok(Endpoint::Unix(PathBuf::from(url.path()))),
            "unix" => Err(ConnectionError::MissingSocketPath(raw.to_string())),
            other => Err(ConnectionError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Lists instances on an established connection.
#[async_trait]
pub trait InstanceSource: Send + Sync {
    async fn list_instances(&self) -> Result<Vec<InstanceRecord>, EnumerationError>;
}

/// Creates clients for an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    type Client: InstanceSource;

    async fn connect(&self, endpoint: &Endpoint) -> Result<Self::Client, ConnectionError>;
}

/// Creates [`LxdClient`]s.
#[derive(Debug, Clone)]
pub struct LxdConnector {
    timeout: Duration,
}

impl LxdConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Connector for LxdConnector {
    type Client = LxdClient;

    async fn connect(&self, endpoint: &Endpoint) -> Result<LxdClient, ConnectionError> {
        match endpoint {
            Endpoint::Unix(socket) => LxdClient::connect_unix(socket.clone(), self.timeout).await,
        }
    }
}

/// Client for the LXD API on a unix socket.
#[derive(Debug, Clone)]
pub struct LxdClient {
    socket: PathBuf,
    timeout: Duration,
    user_agent: String,
}

impl LxdClient {
    /// Create a client and check that the server answers.
    pub async fn connect_unix(socket: PathBuf, timeout: Duration) -> Result<Self, ConnectionError> {
        let client = Self {
            socket,
            timeout,
            user_agent: format!("lxd-provider/{}", env!("CARGO_PKG_VERSION")),
        };

        let server: ApiServer = client.get("/1.0").await?;
        tracing::info!(
            socket = %client.socket.display(),
            api_version = %server.api_version,
            server = %server.environment.server_name,
            server_version = %server.environment.server_version,
            "Connected to LXD"
        );

        Ok(client)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        match tokio::time::timeout(self.timeout, self.request(path)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.timeout.as_secs())),
        }
    }

    async fn request<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        let stream = UnixStream::connect(&self.socket).await?;
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "LXD connection closed with error");
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::HOST, "lxd")
            .header(header::USER_AGENT, &self.user_agent)
            .body(Body::empty())?;

        let response = sender.send_request(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES).await?;

        tracing::trace!(path, status = %status, bytes = bytes.len(), "LXD response");

        if !status.is_success() {
            let message = match serde_json::from_slice::<ApiResponse<serde_json::Value>>(&bytes) {
                Ok(envelope) if !envelope.error.is_empty() => envelope.error,
                _ => String::from_utf8_lossy(&bytes).trim().to_string(),
            };
            return Err(TransportError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)?;
        if envelope.kind == "error" {
            let code = if envelope.error_code != 0 {
                envelope.error_code
            } else {
                status.as_u16()
            };
            return Err(TransportError::Api {
                code,
                message: envelope.error,
            });
        }

        envelope.metadata.ok_or_else(|| TransportError::Api {
            code: envelope.status_code,
            message: format!("response to {} carries no metadata", path),
        })
    }
}

#[async_trait]
impl InstanceSource for LxdClient {
    async fn list_instances(&self) -> Result<Vec<InstanceRecord>, EnumerationError> {
        let instances: Vec<ApiInstance> = self.get(INSTANCES_PATH).await?;
        let total = instances.len();

        let running: Vec<InstanceRecord> = instances
            .into_iter()
            .filter(|instance| instance.status == "Running")
            .map(InstanceRecord::from)
            .collect();

        tracing::debug!(total, running = running.len(), "Listed LXD instances");
        Ok(running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unix_endpoint() {
        let endpoint = Endpoint::parse("unix:///var/lib/lxd/unix.socket").unwrap();
        assert_eq!(endpoint, Endpoint::Unix(PathBuf::from("/var/lib/lxd/unix.socket")));
    }

    #[test]
    fn test_rejects_other_schemes() {
        let err = Endpoint::parse("https://host:1234").unwrap_err();
        assert!(matches!(&err, ConnectionError::UnsupportedScheme(s) if s == "https"));
        assert!(err.to_string().contains("https"));
    }

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let err = Endpoint::parse("/var/lib/lxd/unix.socket").unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn test_connect_to_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::Unix(dir.path().join("absent.socket"));
        let connector = LxdConnector::new(Duration::from_secs(1));

        let err = connector.connect(&endpoint).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Transport(TransportError::Io(_))));
    }
}
