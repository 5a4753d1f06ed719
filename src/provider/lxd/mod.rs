//! LXD provider.
//!
//! Discovers running LXD instances over the daemon's unix socket and
//! turns their `user.traefik.*` config keys into routing configuration.

pub mod client;
pub mod config;
pub mod label;
pub mod types;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{BackoffConfig, ConfigError, LxdConfig};
use crate::dynamic::Message;
use crate::lifecycle::ShutdownSignal;
use crate::provider::rule::RuleTemplate;
use crate::provider::supervisor::Supervisor;
use crate::resilience::backoff::ExponentialBackoff;

use self::client::{Connector, LxdConnector};
use self::config::SnapshotBuilder;

/// Configured, not yet running LXD provider.
pub struct LxdProvider {
    config: LxdConfig,
    backoff: BackoffConfig,
    default_rule: RuleTemplate,
}

impl LxdProvider {
    /// Validate static settings. The default rule template is parsed here,
    /// so a broken template fails startup instead of every cycle.
    pub fn new(config: LxdConfig, backoff: BackoffConfig) -> Result<Self, ConfigError> {
        let default_rule = RuleTemplate::new(&config.default_rule)?;
        Ok(Self {
            config,
            backoff,
            default_rule,
        })
    }

    pub fn config(&self) -> &LxdConfig {
        &self.config
    }

    /// Start discovery against the real LXD daemon.
    pub fn provide(self, publisher: mpsc::Sender<Message>, shutdown: ShutdownSignal) -> JoinHandle<()> {
        let connector = LxdConnector::new(Duration::from_secs(self.config.request_timeout_secs));
        self.provide_with(connector, publisher, shutdown)
    }

    /// Start discovery with a custom connector.
    pub fn provide_with<C>(
        self,
        connector: C,
        publisher: mpsc::Sender<Message>,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<()>
    where
        C: Connector + 'static,
    {
        let supervisor = Supervisor::new(
            self.config.endpoint,
            connector,
            SnapshotBuilder::new(self.config.exposed_by_default, self.default_rule),
            Duration::from_secs(self.config.poll_interval_secs),
            ExponentialBackoff::from_config(&self.backoff),
            publisher,
        );
        tokio::spawn(supervisor.run(shutdown))
    }
}
