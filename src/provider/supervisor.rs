//! Discovery supervisor.
//!
//! # States
//! - Disconnected: task started, nothing attempted yet
//! - Connecting: creating a client and taking the first listing
//! - Connected: client alive, re-listing every poll interval
//! - Backoff: waiting out a retry delay after a failure
//! - Cancelled: shutdown observed, terminal
//!
//! # State Transitions
//! ```text
//! Disconnected → Connecting: endpoint parses
//! Disconnected → Backoff:    endpoint rejected (never reaches Connecting)
//! Connecting → Connected:    client created and first listing published
//! Connecting → Backoff:      connection or listing error
//! Connected → Connected:     poll listing published
//! Connected → Backoff:       listing error, client dropped
//! Backoff → Connecting:      delay elapsed (endpoint re-parsed first)
//! any → Cancelled:           shutdown signal or consumer gone
//! ```
//!
//! # Design Decisions
//! - One task owns all connection state; nothing is shared or locked
//! - Shutdown is checked at every await: backoff sleep, poll sleep,
//!   connect/list calls and the publish hand-off
//! - Retries never run out; only shutdown ends the task
//! - Every successful listing publishes exactly one snapshot, empty or not

use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::dynamic::Message;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::provider::error::DiscoveryError;
use crate::provider::lxd::client::{Connector, Endpoint, InstanceSource};
use crate::provider::lxd::config::SnapshotBuilder;
use crate::provider::lxd::types::InstanceRecord;
use crate::provider::PROVIDER_NAME;
use crate::resilience::backoff::ExponentialBackoff;

/// Connection state, owned by the supervisor task.
#[derive(Debug)]
pub enum ConnectionState<C> {
    Disconnected,
    Connecting(Endpoint),
    Connected(C),
    Backoff(Duration),
    Cancelled,
}

/// Data-free view of [`ConnectionState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    Connected,
    Backoff,
    Cancelled,
}

impl<C> ConnectionState<C> {
    pub fn phase(&self) -> Phase {
        match self {
            ConnectionState::Disconnected => Phase::Disconnected,
            ConnectionState::Connecting(_) => Phase::Connecting,
            ConnectionState::Connected(_) => Phase::Connected,
            ConnectionState::Backoff(_) => Phase::Backoff,
            ConnectionState::Cancelled => Phase::Cancelled,
        }
    }
}

/// Runs the connect → list → publish loop for one provider.
pub struct Supervisor<C: Connector> {
    endpoint: String,
    connector: C,
    builder: SnapshotBuilder,
    poll_interval: Duration,
    publisher: mpsc::Sender<Message>,
    state: ConnectionState<C::Client>,
    backoff: ExponentialBackoff,
    last_error: Option<DiscoveryError>,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(
        endpoint: String,
        connector: C,
        builder: SnapshotBuilder,
        poll_interval: Duration,
        backoff: ExponentialBackoff,
        publisher: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            endpoint,
            connector,
            builder,
            poll_interval,
            publisher,
            state: ConnectionState::Disconnected,
            backoff,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Error behind the current backoff, if any.
    pub fn last_error(&self) -> Option<&DiscoveryError> {
        self.last_error.as_ref()
    }

    /// Run until shutdown.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        tracing::info!(provider = PROVIDER_NAME, endpoint = %self.endpoint, "Provider starting");
        while self.step(&mut shutdown).await != Phase::Cancelled {}
        tracing::info!(provider = PROVIDER_NAME, "Provider stopped");
    }

    /// Perform one state transition and return the new phase.
    pub async fn step(&mut self, shutdown: &mut ShutdownSignal) -> Phase {
        let state = std::mem::replace(&mut self.state, ConnectionState::Cancelled);
        self.state = match state {
            ConnectionState::Cancelled => ConnectionState::Cancelled,
            _ if shutdown.is_shutdown() => ConnectionState::Cancelled,
            ConnectionState::Disconnected => self.begin_connect(),
            ConnectionState::Connecting(endpoint) => self.connect(endpoint, shutdown).await,
            ConnectionState::Connected(client) => self.poll(client, shutdown).await,
            ConnectionState::Backoff(delay) => {
                tokio::select! {
                    biased;
                    _ = shutdown.recv() => ConnectionState::Cancelled,
                    _ = sleep(delay) => self.begin_connect(),
                }
            }
        };

        let phase = self.state.phase();
        tracing::trace!(provider = PROVIDER_NAME, phase = ?phase, "Supervisor step");
        phase
    }

    fn begin_connect(&mut self) -> ConnectionState<C::Client> {
        match Endpoint::parse(&self.endpoint) {
            Ok(endpoint) => ConnectionState::Connecting(endpoint),
            Err(e) => self.enter_backoff(e.into()),
        }
    }

    async fn connect(
        &mut self,
        endpoint: Endpoint,
        shutdown: &mut ShutdownSignal,
    ) -> ConnectionState<C::Client> {
        let started = Instant::now();
        let attempt = tokio::select! {
            biased;
            _ = shutdown.recv() => None,
            result = async {
                let client = self.connector.connect(&endpoint).await?;
                let instances = client.list_instances().await?;
                Ok::<_, DiscoveryError>((client, instances))
            } => Some(result),
        };

        match attempt {
            None => ConnectionState::Cancelled,
            Some(Ok((client, instances))) => {
                metrics::record_cycle("success", started.elapsed());
                if self.backoff.attempts() > 0 {
                    tracing::info!(provider = PROVIDER_NAME, "Provider connection restored");
                }
                self.backoff.reset();
                self.last_error = None;
                if self.publish(instances, shutdown).await {
                    ConnectionState::Connected(client)
                } else {
                    ConnectionState::Cancelled
                }
            }
            Some(Err(e)) => {
                metrics::record_cycle("error", started.elapsed());
                self.enter_backoff(e)
            }
        }
    }

    async fn poll(&mut self, client: C::Client, shutdown: &mut ShutdownSignal) -> ConnectionState<C::Client> {
        tokio::select! {
            biased;
            _ = shutdown.recv() => return ConnectionState::Cancelled,
            _ = sleep(self.poll_interval) => {}
        }

        let started = Instant::now();
        let listed = tokio::select! {
            biased;
            _ = shutdown.recv() => None,
            result = client.list_instances() => Some(result),
        };

        match listed {
            None => ConnectionState::Cancelled,
            Some(Ok(instances)) => {
                metrics::record_cycle("success", started.elapsed());
                if self.publish(instances, shutdown).await {
                    ConnectionState::Connected(client)
                } else {
                    ConnectionState::Cancelled
                }
            }
            Some(Err(e)) => {
                metrics::record_cycle("error", started.elapsed());
                drop(client);
                self.enter_backoff(e.into())
            }
        }
    }

    fn enter_backoff(&mut self, error: DiscoveryError) -> ConnectionState<C::Client> {
        let delay = self.backoff.next_delay();
        tracing::error!(
            provider = PROVIDER_NAME,
            error = %error,
            retry_in = ?delay,
            attempt = self.backoff.attempts(),
            "Provider connection error, retrying"
        );
        metrics::record_backoff(delay);
        self.last_error = Some(error);
        ConnectionState::Backoff(delay)
    }

    /// Build and hand off one snapshot. Returns false if the task must stop.
    async fn publish(&self, instances: Vec<InstanceRecord>, shutdown: &mut ShutdownSignal) -> bool {
        if shutdown.is_shutdown() {
            return false;
        }

        let snapshot = self.builder.build(instances);
        let count = snapshot.len();
        let message = Message {
            provider_name: PROVIDER_NAME.to_string(),
            snapshot,
        };

        let sent = tokio::select! {
            biased;
            _ = shutdown.recv() => return false,
            sent = self.publisher.send(message) => sent,
        };
        if sent.is_err() {
            tracing::warn!(provider = PROVIDER_NAME, "Snapshot consumer closed, stopping provider");
            return false;
        }

        metrics::record_snapshot(count);
        tracing::debug!(provider = PROVIDER_NAME, instances = count, "Published snapshot");
        true
    }
}
