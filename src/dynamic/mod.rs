//! Dynamic configuration published to the proxy core.
//!
//! # Data Flow
//! ```text
//! instance labels
//!     → label::decode into Configuration (per instance)
//!     → Snapshot (enabled instances keyed by name)
//!     → Message { provider_name, snapshot } on the publish channel
//! ```
//!
//! # Design Decisions
//! - A Snapshot replaces the provider's whole contribution; it is never a diff
//! - An empty Snapshot is a valid message ("nothing exposed")
//! - All maps are ordered so serialized snapshots are stable

pub mod http;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::labeled_struct;

pub use http::{
    AddPrefix, Headers, HealthCheck, HttpConfiguration, Middleware, RateLimit, RedirectScheme,
    Router, RouterTls, Server, ServerTemplate, ServersLoadBalancer, Service, StripPrefix,
};

/// Configuration decoded from one instance's labels.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    /// `enable`
    pub enable: bool,
    /// `http`
    pub http: HttpConfiguration,
}

labeled_struct!(Configuration {
    enable => "enable",
    http => "http",
});

/// Every enabled instance's configuration, keyed by instance name.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    pub instances: BTreeMap<String, Configuration>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// One publish from a provider.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub provider_name: String,
    pub snapshot: Snapshot,
}
